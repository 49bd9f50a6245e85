// Library exports for msaeval
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod corrected_reads;
pub mod error;
pub mod evidence;
pub mod gap_stretch;
pub mod msa;
pub mod pipeline;
pub mod report;
