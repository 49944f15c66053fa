//! Ledger SQL shared by the engines.
//!
//! The ledger name is trusted configuration and is interpolated verbatim;
//! hashes and statement texts are always bound as parameters.

/// Split `schema.table` on the last dot, falling back to `default_schema`.
pub(crate) fn split_qualified<'a>(name: &'a str, default_schema: &'a str) -> (&'a str, &'a str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (default_schema, name),
    }
}

/// Strip one pair of surrounding double quotes from an identifier.
pub(crate) fn unquote(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(ident)
}

/// Sequence backing the ledger `id` column, in the ledger's schema.
///
/// Built from the unquoted table part, lowercased, with anything outside
/// `[a-z0-9_]` replaced, so it is always a plain identifier.
pub(crate) fn id_sequence_name(ledger: &str) -> String {
    let (schema, table) = match ledger.rfind('.') {
        Some(pos) => (Some(&ledger[..pos]), &ledger[pos + 1..]),
        None => (None, ledger),
    };
    let base: String = unquote(table)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    match schema {
        Some(schema) => format!("{}.{}_id_seq", schema, base),
        None => format!("{}_id_seq", base),
    }
}

pub(crate) fn lookup_sql(ledger: &str) -> String {
    format!("SELECT COUNT(*) FROM {} WHERE hash = ?", ledger)
}

pub(crate) fn insert_sql(ledger: &str) -> String {
    format!("INSERT INTO {} (hash, statement) VALUES (?, ?)", ledger)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_unqualified() {
        assert_eq!(split_qualified("migrations", "main"), ("main", "migrations"));
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("ops.migrations", "main"), ("ops", "migrations"));
        assert_eq!(split_qualified("db.ops.migrations", "main"), ("db.ops", "migrations"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"Quoted\""), "Quoted");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_id_sequence_name() {
        assert_eq!(id_sequence_name("migrations"), "migrations_id_seq");
        assert_eq!(id_sequence_name("Migrations"), "migrations_id_seq");
        assert_eq!(id_sequence_name("\"Quoted\""), "quoted_id_seq");
        assert_eq!(id_sequence_name("\"my ledger\""), "my_ledger_id_seq");
        assert_eq!(id_sequence_name("ops.ledger"), "ops.ledger_id_seq");
    }

    #[test]
    fn test_sql_interpolates_ledger_name() {
        assert_eq!(
            lookup_sql("ops.ledger"),
            "SELECT COUNT(*) FROM ops.ledger WHERE hash = ?"
        );
        assert_eq!(
            insert_sql("ledger"),
            "INSERT INTO ledger (hash, statement) VALUES (?, ?)"
        );
    }
}
