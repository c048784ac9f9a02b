pub mod init;
pub mod preview;
pub mod sync;

/// Warnings describing data left out of a run
pub(crate) fn partial_data_warnings(dropped_ids: usize, listing_complete: bool) -> Vec<String> {
    let mut warnings = Vec::new();
    if dropped_ids > 0 {
        warnings.push(format!(
            "Warning: {} video(s) were dropped after repeated statistics failures.",
            dropped_ids
        ));
    }
    if !listing_complete {
        warnings.push("Warning: listing stopped early; older videos may be missing.".to_string());
    }
    warnings
}
