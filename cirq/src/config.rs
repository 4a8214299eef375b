//! Circuit options.

use serde::{Deserialize, Serialize};

/// Options for building and loading circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitOptions {
    /// Run the connection policy on every connection of a loaded document.
    /// Documents written by this crate are trusted, so this is off by default.
    #[serde(default)]
    pub verify_on_load: bool,

    /// Rows in the editor's placement grid; new instances fill a column
    /// top to bottom before starting the next one.
    #[serde(default = "default_layout_rows")]
    pub layout_rows: usize,
}

fn default_layout_rows() -> usize {
    2
}

impl Default for CircuitOptions {
    fn default() -> Self {
        Self {
            verify_on_load: false,
            layout_rows: default_layout_rows(),
        }
    }
}

impl CircuitOptions {
    pub fn verified() -> Self {
        Self {
            verify_on_load: true,
            ..Self::default()
        }
    }

    /// `(column, row)` of the placement grid for the n-th placed instance.
    pub fn grid_cell(&self, layout_index: usize) -> (usize, usize) {
        let rows = self.layout_rows.max(1);
        (layout_index / rows, layout_index % rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CircuitOptions::default();
        assert!(!options.verify_on_load);
        assert_eq!(options.layout_rows, 2);
        assert!(CircuitOptions::verified().verify_on_load);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: CircuitOptions = serde_json::from_str(r#"{"verify_on_load": true}"#).unwrap();
        assert!(options.verify_on_load);
        assert_eq!(options.layout_rows, 2);
    }

    #[test]
    fn test_grid_cell() {
        let options = CircuitOptions::default();
        assert_eq!(options.grid_cell(0), (0, 0));
        assert_eq!(options.grid_cell(1), (0, 1));
        assert_eq!(options.grid_cell(2), (1, 0));

        let degenerate = CircuitOptions {
            layout_rows: 0,
            ..CircuitOptions::default()
        };
        assert_eq!(degenerate.grid_cell(3), (3, 0));
    }
}
