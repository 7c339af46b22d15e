use syn::{Error, LitStr, Result};

/// A table, schema or column name. Names that are not bare get quoted in the generated SQL, so any
/// text works except an empty string or one containing NUL.
pub(crate) fn parse_sql_ident(lit: &LitStr, what: &str) -> Result<String> {
    let name = lit.value();
    if name.trim().is_empty() {
        return Err(Error::new(lit.span(), format!("{what} must not be empty")));
    }
    if name.contains('\0') {
        return Err(Error::new(
            lit.span(),
            format!("{what} must not contain a NUL character"),
        ));
    }
    Ok(name)
}
