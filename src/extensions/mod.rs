pub mod scale_ext;
