//! Attribute parsing for the derive macros.
//!
//! Recognized attributes:
//!
//! | Attribute | Position | Meaning |
//! |-----------|----------|---------|
//! | `#[input(query = "k")]` | field | bind from query key `k` |
//! | `#[input(header = "k")]` | field | bind from header `k` |
//! | `#[input(path = "k")]` | field | bind from path segment `k` |
//! | `#[input(body)]` | field | decoded JSON body |
//! | `#[input(raw_body)]` | field | untouched body bytes |
//! | `#[input(skip)]` | field | not bound, `Default::default()` |
//! | `#[input(schema = "path::to_fn")]` | field | constraint set |
//! | `#[input(time_format = "%Y-%m-%d")]` | field | timestamp format |
//! | `#[input(resolve)]`, `#[walk(resolve)]` | struct | type implements `Resolve` |
//! | `#[input(crate = "path")]`, `#[walk(crate = "path")]` | struct | runtime crate path |
//! | `#[walk(rename = "k")]` | field | wire name used in locations |
//! | `#[walk(skip)]` | field | not traversed |

use syn::{
    ext::IdentExt, punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Ident,
    Lit, Meta, Path, Token,
};

/// Where a field of an input shape is bound from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Query string key.
    Query(String),
    /// Header name.
    Header(String),
    /// Path segment name.
    Path(String),
    /// Decoded body.
    Body,
    /// Raw body bytes.
    RawBody,
    /// Not bound.
    Skip,
}

/// Parsed `#[input(..)]` attributes of one field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Binding source, if declared.
    pub binding: Option<Binding>,
    /// Function returning the constraint set.
    pub schema: Option<Path>,
    /// Timestamp format.
    pub time_format: Option<String>,
}

impl FieldAttrs {
    /// Collects every `#[input(..)]` attribute on a field.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for meta in metas(attrs, "input")? {
            match &meta {
                Meta::Path(path) => {
                    let binding = match ident_of(path)?.as_str() {
                        "body" => Binding::Body,
                        "raw_body" => Binding::RawBody,
                        "skip" => Binding::Skip,
                        other => {
                            return Err(syn::Error::new(
                                path.span(),
                                format!("unknown input attribute: {other}"),
                            ))
                        }
                    };
                    parsed.set_binding(binding, &meta)?;
                }
                Meta::NameValue(nv) => {
                    let value = lit_str(&nv.value)?;
                    match ident_of(&nv.path)?.as_str() {
                        "query" => parsed.set_binding(Binding::Query(value), &meta)?,
                        "header" => parsed.set_binding(Binding::Header(value), &meta)?,
                        "path" => parsed.set_binding(Binding::Path(value), &meta)?,
                        "schema" => {
                            let path = syn::parse_str::<Path>(&value).map_err(|e| {
                                syn::Error::new(nv.value.span(), format!("invalid schema path: {e}"))
                            })?;
                            parsed.schema = Some(path);
                        }
                        "time_format" => parsed.time_format = Some(value),
                        other => {
                            return Err(syn::Error::new(
                                nv.path.span(),
                                format!("unknown input attribute: {other}"),
                            ))
                        }
                    }
                }
                Meta::List(list) => {
                    return Err(syn::Error::new(list.span(), "expected `name` or `name = \"value\"`"))
                }
            }
        }

        Ok(parsed)
    }

    fn set_binding(&mut self, binding: Binding, meta: &Meta) -> syn::Result<()> {
        if self.binding.is_some() {
            return Err(syn::Error::new(
                meta.span(),
                "field already has a binding source",
            ));
        }
        self.binding = Some(binding);
        Ok(())
    }
}

/// Parsed struct-level attributes shared by both derives.
#[derive(Debug, Default)]
pub struct ContainerAttrs {
    /// The type implements `Resolve`.
    pub resolve: bool,
    /// Runtime crate path override.
    pub krate: Option<Path>,
}

impl ContainerAttrs {
    /// Collects struct-level `#[<name>(..)]` attributes.
    pub fn from_attrs(attrs: &[Attribute], name: &str) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for meta in metas(attrs, name)? {
            match &meta {
                Meta::Path(path) if path.is_ident("resolve") => parsed.resolve = true,
                Meta::NameValue(nv) if nv.path.is_ident("crate") => {
                    let value = lit_str(&nv.value)?;
                    let path = syn::parse_str::<Path>(&value).map_err(|e| {
                        syn::Error::new(nv.value.span(), format!("invalid crate path: {e}"))
                    })?;
                    parsed.krate = Some(path);
                }
                _ => {
                    return Err(syn::Error::new(
                        meta.span(),
                        format!("unknown {name} attribute; expected `resolve` or `crate = \"..\"`"),
                    ))
                }
            }
        }

        Ok(parsed)
    }

    /// Returns the runtime crate path, `::plinth_bind` unless overridden.
    pub fn runtime(&self) -> Path {
        self.krate
            .clone()
            .unwrap_or_else(|| syn::parse_quote!(::plinth_bind))
    }
}

/// Parsed `#[walk(..)]` attributes of one field.
#[derive(Debug, Default)]
pub struct WalkFieldAttrs {
    /// Wire name override.
    pub rename: Option<String>,
    /// Field is not traversed.
    pub skip: bool,
}

impl WalkFieldAttrs {
    /// Collects every `#[walk(..)]` attribute on a field.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for meta in metas(attrs, "walk")? {
            match &meta {
                Meta::Path(path) if path.is_ident("skip") => parsed.skip = true,
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    parsed.rename = Some(lit_str(&nv.value)?);
                }
                _ => {
                    return Err(syn::Error::new(
                        meta.span(),
                        "unknown walk attribute; expected `skip` or `rename = \"..\"`",
                    ))
                }
            }
        }

        Ok(parsed)
    }
}

/// Case conventions understood from `#[serde(rename_all = "..")]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &str) -> Option<Self> {
        Some(match rule {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            _ => return None,
        })
    }

    /// Applies the rule to a snake_case field name.
    pub fn apply(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_ascii_lowercase(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
            Self::Pascal => pascal(field),
            Self::Camel => {
                let pascal = pascal(field);
                let mut chars = pascal.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_ascii_lowercase().to_string() + chars.as_str()
                })
            }
        }
    }
}

fn pascal(field: &str) -> String {
    field
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// Reads `#[serde(rename_all = "..")]` from a container.
pub fn serde_rename_all(attrs: &[Attribute]) -> Option<RenameRule> {
    serde_value(attrs, "rename_all").and_then(|rule| RenameRule::parse(&rule))
}

/// Reads `#[serde(rename = "..")]` (or its `deserialize` half) from a field.
pub fn serde_rename(attrs: &[Attribute]) -> Option<String> {
    serde_value(attrs, "rename")
}

fn serde_value(attrs: &[Attribute], key: &str) -> Option<String> {
    // serde validates its own attributes; anything unparseable here is ignored.
    let metas = metas(attrs, "serde").ok()?;
    metas.into_iter().find_map(|meta| match meta {
        Meta::NameValue(nv) if nv.path.is_ident(key) => lit_str(&nv.value).ok(),
        Meta::List(list) if list.path.is_ident(key) => list
            .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
            .ok()?
            .into_iter()
            .find_map(|inner| match inner {
                Meta::NameValue(nv) if nv.path.is_ident("deserialize") => lit_str(&nv.value).ok(),
                _ => None,
            }),
        _ => None,
    })
}

/// Returns a field's identifier without any `r#` prefix.
pub fn field_name(ident: &Ident) -> String {
    ident.unraw().to_string()
}

fn metas(attrs: &[Attribute], name: &str) -> syn::Result<Vec<Meta>> {
    let mut out = Vec::new();
    for attr in attrs.iter().filter(|a| a.path().is_ident(name)) {
        let list = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        out.extend(list);
    }
    Ok(out)
}

fn ident_of(path: &Path) -> syn::Result<String> {
    path.get_ident()
        .map(ToString::to_string)
        .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))
}

fn lit_str(expr: &Expr) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        _ => Err(syn::Error::new(expr.span(), "expected string literal")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn field_attrs(attrs: Vec<Attribute>) -> syn::Result<FieldAttrs> {
        FieldAttrs::from_attrs(&attrs)
    }

    #[test]
    fn test_parse_query_binding() {
        let attrs = field_attrs(vec![parse_quote!(#[input(query = "tags", schema = "limits::tags")])])
            .unwrap();
        assert_eq!(attrs.binding, Some(Binding::Query("tags".to_string())));
        assert_eq!(attrs.schema.unwrap().segments.len(), 2);
    }

    #[test]
    fn test_parse_body_and_time_format() {
        let attrs = field_attrs(vec![parse_quote!(#[input(body)])]).unwrap();
        assert_eq!(attrs.binding, Some(Binding::Body));

        let attrs = field_attrs(vec![parse_quote!(#[input(query = "t", time_format = "%Y-%m-%d")])])
            .unwrap();
        assert_eq!(attrs.time_format.as_deref(), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_two_sources_rejected() {
        let err = field_attrs(vec![parse_quote!(#[input(query = "a", header = "b")])]).unwrap_err();
        assert!(err.to_string().contains("already has a binding source"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        assert!(field_attrs(vec![parse_quote!(#[input(cookie = "a")])]).is_err());
        assert!(field_attrs(vec![parse_quote!(#[input(query = 1)])]).is_err());
    }

    #[test]
    fn test_container_attrs() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[input(resolve, crate = "plinth::bind")])];
        let parsed = ContainerAttrs::from_attrs(&attrs, "input").unwrap();
        assert!(parsed.resolve);
        let runtime = parsed.runtime();
        assert_eq!(quote::quote!(#runtime).to_string(), "plinth :: bind");

        let parsed = ContainerAttrs::from_attrs(&[], "walk").unwrap();
        let runtime = parsed.runtime();
        assert_eq!(quote::quote!(#runtime).to_string(), ":: plinth_bind");
    }

    #[test]
    fn test_serde_names() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[serde(default)]),
            parse_quote!(#[serde(rename = "fooBar")]),
        ];
        assert_eq!(serde_rename(&attrs).as_deref(), Some("fooBar"));

        let attrs: Vec<Attribute> =
            vec![parse_quote!(#[serde(rename(serialize = "a", deserialize = "b"))])];
        assert_eq!(serde_rename(&attrs).as_deref(), Some("b"));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[serde(rename_all = "camelCase")])];
        assert_eq!(serde_rename_all(&attrs), Some(RenameRule::Camel));
    }

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::Camel.apply("max_items"), "maxItems");
        assert_eq!(RenameRule::Pascal.apply("max_items"), "MaxItems");
        assert_eq!(RenameRule::Kebab.apply("max_items"), "max-items");
        assert_eq!(RenameRule::ScreamingSnake.apply("max_items"), "MAX_ITEMS");
    }

    #[test]
    fn test_raw_identifier_name() {
        let ident: Ident = parse_quote!(r#type);
        assert_eq!(field_name(&ident), "type");
    }
}
