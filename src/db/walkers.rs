//! Walkers pair a `ParserDatabase` reference with an ID and expose the
//! resolved view of the node behind it.

mod enums;
mod fields;
mod indexes;
mod models;
mod relations;

pub use enums::*;
pub use fields::*;
pub use indexes::*;
pub use models::*;
pub use relations::*;

use super::ParserDatabase;

#[derive(Clone, Copy)]
pub struct Walker<'db, I> {
    pub db: &'db ParserDatabase,
    pub id: I,
}

impl<'db, I> Walker<'db, I> {
    pub fn walk<J>(self, id: J) -> Walker<'db, J> {
        self.db.walk(id)
    }
}

impl<I: PartialEq> PartialEq for Walker<'_, I> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<I: std::fmt::Debug> std::fmt::Debug for Walker<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Walker").field(&self.id).finish()
    }
}

/// Builds `{table}_{columns}_{suffix}`, shortening the prefix so that the
/// result fits in `max_len` bytes.
pub(crate) fn constraint_name(
    table: &str,
    columns: &[&str],
    suffix: &str,
    max_len: usize,
) -> String {
    let mut prefix = table.to_string();
    for column in columns {
        prefix.push('_');
        prefix.push_str(column);
    }

    let limit = max_len.saturating_sub(suffix.len() + 1);
    if prefix.len() > limit {
        let mut end = limit;
        while !prefix.is_char_boundary(end) {
            end -= 1;
        }
        prefix.truncate(end);
    }
    format!("{prefix}_{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_name() {
        assert_eq!(constraint_name("User", &[], "pkey", 63), "User_pkey");
        assert_eq!(
            constraint_name("Post", &["a", "b"], "key", 63),
            "Post_a_b_key"
        );
    }

    #[test]
    fn test_constraint_name_truncation() {
        let table = "t".repeat(70);
        let name = constraint_name(&table, &["col"], "fkey", 63);
        assert_eq!(name.len(), 63);
        assert!(name.ends_with("_fkey"));
    }
}
