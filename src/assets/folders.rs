use super::FolderSummary;
use crate::catalog::{Asset, normalize_category};
use std::collections::HashMap;

/// Derive the folder listing from a catalog snapshot: the fixed vocabulary
/// unioned with every observed category, with per-folder counts. Pure
/// function of its inputs; recomputed whenever the snapshot changes.
pub fn folder_index(snapshot: &[Asset], vocabulary: &[&str]) -> Vec<FolderSummary> {
    // Normalized key -> display label. Vocabulary entries claim their
    // display form first; the first-seen stored form wins for the rest.
    let mut display: HashMap<String, String> = HashMap::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for label in vocabulary {
        let key = normalize_category(label);
        display.entry(key.clone()).or_insert_with(|| label.to_string());
        counts.entry(key).or_insert(0);
    }

    for asset in snapshot {
        let key = asset.normalized_category();
        display
            .entry(key.clone())
            .or_insert_with(|| asset.display_category().to_string());
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut folders: Vec<FolderSummary> = counts
        .into_iter()
        .map(|(key, count)| FolderSummary {
            name: display.remove(&key).unwrap_or(key),
            count,
        })
        .collect();
    folders.sort_by(|a, b| a.name.cmp(&b.name));
    folders
}
