//! Arena corpus fixtures written to a temporary directory

use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;

/// Battle and embedding files for a small topical corpus
///
/// `arena-strong` wins math prompts 8:2 and loses chat prompts 2:8.
/// A third model only ever plays ties, which are dropped on load.
pub struct ArenaFiles {
    _dir: TempDir,
    pub battles: PathBuf,
    pub embeddings: PathBuf,
}

impl ArenaFiles {
    pub fn topical() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut battles = Vec::new();
        let mut embeddings = Vec::new();

        for (topic, strong_wins) in [([1.0, 0.0], 8), ([0.0, 1.0], 2)] {
            for i in 0..10 {
                let winner = if i < strong_wins { "model_a" } else { "model_b" };
                battles.push(json!({"model_a": "arena-strong", "model_b": "arena-weak", "winner": winner}));
                embeddings.push(json!(topic));
            }
        }
        battles.push(json!({"model_a": "arena-strong", "model_b": "arena-weak", "winner": "tie (bothbad)"}));
        embeddings.push(json!([0.5, 0.5]));

        let battles_path = dir.path().join("battles.json");
        let embeddings_path = dir.path().join("embeddings.json");
        std::fs::write(&battles_path, serde_json::to_vec(&battles).unwrap()).unwrap();
        std::fs::write(&embeddings_path, serde_json::to_vec(&embeddings).unwrap()).unwrap();

        Self {
            _dir: dir,
            battles: battles_path,
            embeddings: embeddings_path,
        }
    }
}
