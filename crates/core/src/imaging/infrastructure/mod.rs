pub mod jpeg_memory_decoder;
