pub mod header_utils;
pub mod temp_file;
pub mod text_normalization;
