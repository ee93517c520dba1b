use crate::app_config::CodePolicy;
use crate::sheet::NormalizedRow;
use crate::slug::slugify;

/// Separator between levels in a join key.
pub const JOIN_SEPARATOR: &str = " | ";

/// One prefix of a row's category path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPath {
    /// 1-based depth, equal to `levels.len()`.
    pub depth: usize,
    pub levels: Vec<String>,
    /// `levels.join(" | ")`, used for logging and `FullPath` codes.
    pub join_key: String,
    /// Persistent identity of the node for this path.
    pub code: String,
    /// Leaf level, used as the node's translated name.
    pub display_name: String,
}

impl DerivedPath {
    /// Levels of the path one level up, `None` at depth 1.
    #[must_use]
    pub fn parent_levels(&self) -> Option<&[String]> {
        (self.depth > 1).then(|| &self.levels[..self.depth - 1])
    }
}

/// Derive every strict-prefix path of `row` over `level_columns`.
///
/// Derivation stops at the first empty level, so `["A", "", "C"]` yields
/// only the depth-1 path `["A"]`.
#[must_use]
pub fn derive_paths(
    row: &NormalizedRow,
    level_columns: &[String],
    policy: CodePolicy,
) -> Vec<DerivedPath> {
    let levels: Vec<String> = level_columns
        .iter()
        .map(|col| row.get(col))
        .take_while(|value| !value.is_empty())
        .map(str::to_string)
        .collect();

    (1..=levels.len())
        .map(|depth| {
            let prefix = levels[..depth].to_vec();
            let join_key = prefix.join(JOIN_SEPARATOR);
            let display_name = prefix[depth - 1].clone();
            let code = match policy {
                CodePolicy::FullPath => slugify(&join_key),
                CodePolicy::Leaf => slugify(&display_name),
            };
            DerivedPath {
                depth,
                levels: prefix,
                join_key,
                code,
                display_name,
            }
        })
        .collect()
}
