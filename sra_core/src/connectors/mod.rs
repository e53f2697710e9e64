pub mod sra;
