fn main() {
    viewer::run_viewer_app();
}
