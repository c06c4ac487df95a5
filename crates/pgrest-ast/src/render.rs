//! Render a select tree back to `select` syntax
//!
//! Parsing the output of [`render_select`] yields the same select list and
//! join map. JSON paths are always written with `->`.

use std::fmt::{self, Display};

use crate::ast::{Aggregate, ColumnDef, EmbedDef, JoinDef, JoinMap, JoinType, SelectEntry};

/// A select list with its join map, displayed as `select` text
#[derive(Debug, Clone, Copy)]
pub struct SelectDisplay<'a> {
    pub select: &'a [SelectEntry],
    pub join: &'a JoinMap,
}

impl Display for SelectDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, entry) in self.select.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            match entry {
                SelectEntry::Star => f.write_str("*")?,
                SelectEntry::Column(name) => write_ident(f, name)?,
                SelectEntry::Field { alias, def } => write_field(f, alias, def)?,
                SelectEntry::Embed { alias, def } => {
                    write_embed(f, alias, def, self.join.get(alias))?
                }
            }
        }
        Ok(())
    }
}

pub fn render_select(select: &[SelectEntry], join: &JoinMap) -> String {
    SelectDisplay { select, join }.to_string()
}

fn write_ident(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let bare = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare {
        f.write_str(name)
    } else {
        write!(f, "\"{name}\"")
    }
}

fn write_cast(f: &mut fmt::Formatter<'_>, cast: Option<&str>) -> fmt::Result {
    match cast {
        Some(cast) => {
            f.write_str("::")?;
            write_ident(f, cast)
        }
        None => Ok(()),
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, alias: &str, def: &ColumnDef) -> fmt::Result {
    // standalone `count()`
    if def.aggregate == Some(Aggregate::Count) && def.column.is_none() {
        if alias != "count" {
            write_ident(f, alias)?;
            f.write_str(":")?;
        }
        f.write_str("count()")?;
        return write_cast(f, def.cast.as_deref());
    }

    let column = def.column.as_deref().unwrap_or(alias);
    let segments: Vec<&str> = def
        .path
        .as_deref()
        .map(|path| path.trim_start_matches("$.").split('.').collect())
        .unwrap_or_default();
    let implied_alias = segments.last().copied().unwrap_or(column);

    // `x:x` parses to an empty def, which must not collapse to a bare column
    if alias != implied_alias || *def == ColumnDef::default() {
        write_ident(f, alias)?;
        f.write_str(":")?;
    }
    write_ident(f, column)?;
    for segment in &segments {
        f.write_str("->")?;
        write_ident(f, segment)?;
    }

    match def.aggregate {
        Some(aggregate) => {
            write_cast(f, def.pre_cast.as_deref())?;
            write!(f, ".{}()", aggregate.as_str())?;
            write_cast(f, def.cast.as_deref())
        }
        None => write_cast(f, def.cast.as_deref()),
    }
}

fn write_embed(
    f: &mut fmt::Formatter<'_>,
    alias: &str,
    def: &EmbedDef,
    join: Option<&JoinDef>,
) -> fmt::Result {
    let join = join.cloned().unwrap_or_default();

    if def.spread {
        f.write_str("...")?;
        write_ident(f, alias)?;
    } else if let Some(from) = &join.from {
        write_ident(f, alias)?;
        f.write_str(":")?;
        write_ident(f, from)?;
    } else {
        write_ident(f, alias)?;
    }

    if let Some(hint) = &join.hint {
        f.write_str("!")?;
        write_ident(f, hint)?;
    }
    if join.join_type == JoinType::Inner {
        f.write_str("!inner")?;
    }

    let nested = def.join.clone().unwrap_or_default();
    write!(
        f,
        "({})",
        SelectDisplay {
            select: &def.select,
            join: &nested,
        }
    )
}
