pub mod viewer_runtime;
