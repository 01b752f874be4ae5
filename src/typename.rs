//! Parsing, comparison, and formatting of .NET-style assembly-qualified type
//! names, e.g. `Microsoft.Xna.Framework.Content.Texture2DReader` or a generic
//! `Microsoft.Xna.Framework.Content.ListReader\`1[[System.Single]]`.

use std::fmt;

/// A parsed type name: a bare name, its ordered subtype arguments (for
/// generic readers), and whether it denotes an array type.
#[derive(Debug, Clone)]
pub struct TypeName {
    pub name: String,
    pub subtypes: Vec<TypeName>,
    pub is_array: bool,
}

impl TypeName {
    /// Parses a type name, discarding everything from the first top-level
    /// `,` onward (the assembly qualifier) so that equality is unaffected by
    /// it.
    pub fn parse(s: &str) -> Self {
        let unqualified = split_assembly_qualifier(s);
        let (name, subtypes) = split_backtick_subtypes(unqualified);
        let is_array = name.ends_with("[]");
        TypeName {
            name,
            subtypes,
            is_array,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.subtypes.is_empty() {
            write!(f, "`{}[", self.subtypes.len())?;
            for (i, sub) in self.subtypes.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "[{sub}]")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Equality ignores the assembly qualifier (already stripped at parse time)
/// and compares name, subtypes, and array-ness structurally.
impl PartialEq for TypeName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.is_array == other.is_array && self.subtypes == other.subtypes
    }
}
impl Eq for TypeName {}

fn split_assembly_qualifier(s: &str) -> &str {
    // The qualifier is the text after the first top-level comma; a comma
    // inside a bracketed subtype group doesn't count, so track depth.
    let mut depth = 0i32;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => return &s[..i],
            _ => {}
        }
    }
    s
}

/// Splits `Name\`N[[sub1],[sub2],...]` into `(Name, [sub1, sub2, ...])`. A
/// name with no backtick has no subtypes.
fn split_backtick_subtypes(s: &str) -> (String, Vec<TypeName>) {
    let Some(tick) = s.find('`') else {
        return (s.to_string(), Vec::new());
    };
    let name = s[..tick].to_string();
    let rest = &s[tick + 1..];
    // rest begins with the subtype count digits, then `[[...],[...]]`.
    let Some(open) = rest.find('[') else {
        return (name, Vec::new());
    };
    let group = &rest[open..];
    let subtypes = split_bracket_groups(group)
        .into_iter()
        .map(TypeName::parse)
        .collect();
    (name, subtypes)
}

/// Given `[[A],[B,C]]`, returns `["A", "B,C"]` — the contents of each
/// top-level `[...]` group inside the outer bracket pair.
fn split_bracket_groups(s: &str) -> Vec<String> {
    let inner = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(s);
    let mut groups = Vec::new();
    let mut depth = 0i32;
    let mut start = None;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            ']' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s0) = start.take() {
                        groups.push(inner[s0..i].to_string());
                    }
                }
            }
            _ => {}
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_assembly_qualifier() {
        let a = TypeName::parse("Microsoft.Xna.Framework.Content.Texture2DReader");
        let b = TypeName::parse(
            "Microsoft.Xna.Framework.Content.Texture2DReader, Microsoft.Xna.Framework, Version=4.0.0.0",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn array_suffix_is_detected() {
        let t = TypeName::parse("System.Single[]");
        assert!(t.is_array);
        assert_eq!(t.name, "System.Single[]");
    }

    #[test]
    fn generic_subtype_is_parsed() {
        let t = TypeName::parse(
            "Microsoft.Xna.Framework.Content.ListReader`1[[System.Single, mscorlib]]",
        );
        assert_eq!(t.name, "Microsoft.Xna.Framework.Content.ListReader");
        assert_eq!(t.subtypes.len(), 1);
        assert_eq!(t.subtypes[0].name, "System.Single");
    }

    #[test]
    fn multi_subtype_generic_is_parsed() {
        let t = TypeName::parse(
            "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String],[System.Int32]]",
        );
        assert_eq!(t.subtypes.len(), 2);
        assert_eq!(t.subtypes[0].name, "System.String");
        assert_eq!(t.subtypes[1].name, "System.Int32");
    }

    #[test]
    fn display_round_trips_generic_shape() {
        let t = TypeName::parse("Foo.Bar`1[[System.Single]]");
        assert_eq!(t.to_string(), "Foo.Bar`1[[System.Single]]");
    }
}
