// Licensed under the Apache-2.0 license

//! Indentation-driven reader for register definition files.
//!
//! Each non-blank line declares one entry. Indentation picks the level
//! (address, field, value); the first token is the entry's name and the
//! rest are directives:
//!
//! ```text
//! LW_PGRAPH_GPCx_CTRL -replace_array GPCx=GPC%d 8 -domain GR
//!     _ENABLE            # LW_PGRAPH_GPC0_CTRL_ENABLE, ...
//!         _NO
//!         _YES
//! ```
//!
//! Any violation is fatal and reported with its line; there is no partial
//! result.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::{CompilerConfig, IdLayout};
use crate::error::{ParseError, ParseErrorKind};
use crate::types::{
    ArrayDim, ArrayReplace, Candidate, Entry, EntryId, EntryKind, Forest, Template,
    VirtualMirror, DEFAULT_DOMAIN,
};
use crate::util::{natural_cmp, strip_comment};

const MAX_DEPTH: usize = 3;

/// One parsed directive token group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    ArrayLimit(u32),
    Domain(String),
    VirtualMirror(String),
    VirtualExport,
    ReplaceArray { old: String, new: String, limit: u32 },
    ReplaceStride { old: String, stride: String, limit: u32 },
    ReplaceString { old: String, new: String },
    Alias(String),
    Cap(String),
}

impl Directive {
    fn keyword(&self) -> &'static str {
        match self {
            Directive::ArrayLimit(_) => "array limit",
            Directive::Domain(_) => "-domain",
            Directive::VirtualMirror(_) => "-virtual_mirror",
            Directive::VirtualExport => "-virtual_export",
            Directive::ReplaceArray { .. } | Directive::ReplaceStride { .. } => "-replace_array",
            Directive::ReplaceString { .. } => "-replace_string",
            Directive::Alias(_) => "-alias",
            Directive::Cap(_) => "-cap",
        }
    }

    /// Whether the directive may appear on an entry of `kind`.
    fn allowed_on(&self, kind: EntryKind) -> bool {
        match self {
            Directive::ArrayLimit(_) | Directive::Alias(_) | Directive::Cap(_) => true,
            _ => kind == EntryKind::Address,
        }
    }
}

/// Splits the directive tokens following an entry name.
pub fn parse_directives<'a>(
    tokens: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<Directive>, ParseErrorKind> {
    let mut tokens = tokens.into_iter();
    let mut directives = Vec::new();
    while let Some(token) = tokens.next() {
        let mut arg = |directive: &str| {
            tokens
                .next()
                .map(str::to_string)
                .ok_or_else(|| ParseErrorKind::MissingArgument(directive.to_string()))
        };
        let directive = match token {
            "-domain" => Directive::Domain(arg(token)?),
            "-virtual_mirror" => Directive::VirtualMirror(arg(token)?),
            "-virtual_export" => Directive::VirtualExport,
            "-alias" => Directive::Alias(arg(token)?),
            "-cap" => Directive::Cap(arg(token)?),
            "-replace_string" => {
                let rule = arg(token)?;
                let (old, new) = split_rule(token, &rule, "=")?;
                Directive::ReplaceString { old, new }
            }
            "-replace_array" => {
                let rule = arg(token)?;
                let limit = parse_limit(&arg(token)?)?;
                if rule.contains("*=") {
                    let (old, stride) = split_rule(token, &rule, "*=")?;
                    Directive::ReplaceStride { old, stride, limit }
                } else {
                    let (old, new) = split_rule(token, &rule, "=")?;
                    Directive::ReplaceArray { old, new, limit }
                }
            }
            t if t.starts_with(|c: char| c.is_ascii_digit()) => {
                Directive::ArrayLimit(parse_limit(t)?)
            }
            t => return Err(ParseErrorKind::InvalidDirective(t.to_string())),
        };
        directives.push(directive);
    }
    Ok(directives)
}

fn split_rule(
    directive: &str,
    rule: &str,
    separator: &str,
) -> Result<(String, String), ParseErrorKind> {
    match rule.split_once(separator) {
        Some((old, new)) if !old.is_empty() => Ok((old.to_string(), new.to_string())),
        _ => Err(ParseErrorKind::MalformedArgument {
            directive: directive.to_string(),
            arg: rule.to_string(),
        }),
    }
}

fn parse_limit(token: &str) -> Result<u32, ParseErrorKind> {
    match token.parse::<u32>() {
        Ok(limit) if limit > 0 => Ok(limit),
        _ => Err(ParseErrorKind::BadArrayLimit(token.to_string())),
    }
}

/// Parses a definition file into an entry forest.
pub fn parse(text: &str, config: &CompilerConfig, layout: IdLayout) -> Result<Forest, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    if let Some((i, line)) = lines.iter().enumerate().find(|(_, l)| l.contains('\t')) {
        return Err(ParseError::new(i + 1, line, ParseErrorKind::TabCharacter));
    }

    let mut parser = Parser {
        config,
        layout,
        forest: Forest::default(),
        indents: Vec::new(),
        last_at_level: [None; MAX_DEPTH],
    };
    for (i, raw) in lines.iter().enumerate() {
        let stripped = strip_comment(raw);
        if stripped.trim().is_empty() {
            continue;
        }
        parser
            .parse_line(i + 1, &stripped)
            .map_err(|kind| ParseError::new(i + 1, raw, kind))?;
    }
    parser.finish(&lines)?;
    Ok(parser.forest)
}

struct Parser<'a> {
    config: &'a CompilerConfig,
    layout: IdLayout,
    forest: Forest,
    indents: Vec<usize>,
    /// Most recent entry created at each level; deeper slots are cleared
    /// whenever a shallower entry starts.
    last_at_level: [Option<EntryId>; MAX_DEPTH],
}

impl Parser<'_> {
    fn parse_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseErrorKind> {
        let level = self.track_indent(line)?;
        let kind = EntryKind::from_level(level).ok_or(ParseErrorKind::TooDeep)?;
        let mut tokens = line.split_whitespace();
        let Some(name_token) = tokens.next() else {
            return Ok(());
        };
        let id = self.add_entry(line_no, kind, name_token)?;
        for directive in parse_directives(tokens)? {
            self.apply_directive(id, directive)?;
        }
        Ok(())
    }

    /// Pushes or pops the indent stack and returns the new nesting level.
    fn track_indent(&mut self, line: &str) -> Result<usize, ParseErrorKind> {
        let indent = line.len() - line.trim_start_matches(' ').len();
        match self.indents.last() {
            Some(&top) if indent == top => {}
            Some(&top) if indent < top => {
                while self.indents.last().is_some_and(|&t| t > indent) {
                    self.indents.pop();
                }
                if self.indents.last() != Some(&indent) {
                    return Err(ParseErrorKind::BadIndent);
                }
            }
            _ => {
                if self.indents.len() == MAX_DEPTH {
                    return Err(ParseErrorKind::TooDeep);
                }
                self.indents.push(indent);
            }
        }
        Ok(self.indents.len() - 1)
    }

    fn add_entry(
        &mut self,
        line: usize,
        kind: EntryKind,
        token: &str,
    ) -> Result<EntryId, ParseErrorKind> {
        let level = kind.level();
        let parent = match level {
            0 => None,
            _ => Some(self.last_at_level[level - 1].ok_or(ParseErrorKind::BadIndent)?),
        };
        let previous = self.last_at_level[level];

        let name = match kind {
            EntryKind::Address => token.to_string(),
            _ => token.strip_prefix('_').unwrap_or(token).to_string(),
        };
        if name.is_empty() {
            return Err(ParseErrorKind::MalformedArgument {
                directive: kind.as_str().to_string(),
                arg: token.to_string(),
            });
        }

        if let Some(prev) = previous.map(|p| self.forest.get(p)) {
            if prev.name == name {
                return Err(ParseErrorKind::DuplicateName(name));
            }
            if natural_cmp(&name, &prev.name) != Ordering::Greater {
                return Err(ParseErrorKind::OutOfOrder {
                    previous: prev.name.clone(),
                    name,
                });
            }
        }

        let sequence_id = previous.map_or(1, |p| self.forest.get(p).sequence_id + 1);
        let max = self.config.limits.max_for(kind);
        if sequence_id > max {
            return Err(ParseErrorKind::SequenceOverflow {
                kind: kind.as_str(),
                max,
            });
        }

        let (symbol, candidates, packed_id) = match parent {
            None => {
                let rest = name.strip_prefix(self.config.source_prefix.as_str()).ok_or_else(
                    || ParseErrorKind::MissingSourcePrefix(self.config.source_prefix.clone()),
                )?;
                (
                    format!("{}{}", self.config.symbol_prefix, rest),
                    vec![Candidate::new(name.as_str(), DEFAULT_DOMAIN)],
                    self.layout.pack(kind, sequence_id, 0, 0),
                )
            }
            Some(parent_id) => {
                let parent = self.forest.get(parent_id);
                let candidates: Vec<Candidate> = parent
                    .candidates
                    .iter()
                    .map(|c| Candidate::new(format!("{}_{}", c.name, name), c.domain.as_str()))
                    .collect();
                let packed_id = match parent.kind {
                    EntryKind::Address => {
                        self.layout.pack(kind, parent.sequence_id, sequence_id, 0)
                    }
                    _ => {
                        let address = self.forest.address_of(parent_id);
                        self.layout.pack(kind, address.sequence_id, parent.sequence_id, sequence_id)
                    }
                };
                (format!("{}_{}", parent.symbol, name), candidates, packed_id)
            }
        };

        let id = self.forest.push(Entry {
            name,
            kind,
            symbol,
            candidates,
            sequence_id,
            packed_id,
            dims: Vec::new(),
            templates: Vec::new(),
            virtual_mirror: None,
            capability: None,
            domain: None,
            access: Default::default(),
            parent,
            children: Vec::new(),
            line,
        });
        self.last_at_level[level] = Some(id);
        for slot in self.last_at_level[level + 1..].iter_mut() {
            *slot = None;
        }
        Ok(id)
    }

    fn apply_directive(&mut self, id: EntryId, directive: Directive) -> Result<(), ParseErrorKind> {
        let config = self.config;
        let entry = self.forest.get_mut(id);
        if !directive.allowed_on(entry.kind) {
            return Err(ParseErrorKind::InvalidDirective(directive.keyword().to_string()));
        }
        match directive {
            Directive::ArrayLimit(limit) => entry.dims.push(ArrayDim::suffix(limit)),
            Directive::Domain(domain) => {
                if entry.domain.is_some() {
                    return Err(ParseErrorKind::AlreadySet("domain"));
                }
                for candidate in entry.candidates.iter_mut() {
                    candidate.domain = domain.clone();
                }
                entry.domain = Some(domain);
            }
            Directive::VirtualMirror(target) => {
                check_mirror(entry, config)?;
                if !target.starts_with(config.virtual_prefix.as_str()) {
                    return Err(ParseErrorKind::BadVirtualPrefix {
                        name: target,
                        prefix: config.virtual_prefix.clone(),
                    });
                }
                entry.virtual_mirror = Some(VirtualMirror {
                    from: entry.name.clone(),
                    to: target,
                });
            }
            Directive::VirtualExport => {
                check_mirror(entry, config)?;
                entry.virtual_mirror = Some(VirtualMirror {
                    from: config.source_prefix.clone(),
                    to: config.virtual_prefix.clone(),
                });
            }
            Directive::ReplaceArray { old, new, limit } => entry.dims.push(ArrayDim {
                limit,
                replace: ArrayReplace::Substitute { old, new },
            }),
            Directive::ReplaceStride { old, stride, limit } => {
                let rest = stride
                    .strip_prefix(config.source_prefix.as_str())
                    .ok_or_else(|| ParseErrorKind::MalformedArgument {
                        directive: "-replace_array".to_string(),
                        arg: stride.clone(),
                    })?;
                entry.dims.push(ArrayDim {
                    limit,
                    replace: ArrayReplace::Stride {
                        old,
                        stride_symbol: format!("{}{}", config.symbol_prefix, rest),
                    },
                })
            }
            Directive::ReplaceString { old, new } => entry.templates.push(Template { old, new }),
            Directive::Alias(alias) => add_alias(entry, &alias),
            Directive::Cap(cap) => {
                if entry.capability.is_some() {
                    return Err(ParseErrorKind::AlreadySet("capability"));
                }
                if !cap.starts_with(config.cap_prefix.as_str()) {
                    return Err(ParseErrorKind::BadCapPrefix {
                        name: cap,
                        prefix: config.cap_prefix.clone(),
                    });
                }
                entry.capability = Some(cap);
            }
        }
        Ok(())
    }

    /// Validates substitution targets and symbol uniqueness.
    fn finish(&self, lines: &[&str]) -> Result<(), ParseError> {
        let fail = |entry: &Entry, kind| {
            let text = lines.get(entry.line - 1).copied().unwrap_or_default();
            ParseError::new(entry.line, text, kind)
        };
        let mut symbols: HashMap<&str, EntryId> = HashMap::new();
        for (id, entry) in self.forest.entries().iter().enumerate() {
            let targets = entry
                .templates
                .iter()
                .map(|t| t.old.as_str())
                .chain(entry.dims.iter().filter_map(|d| d.replace.target()));
            for target in targets {
                if !entry.candidates.iter().any(|c| c.name.contains(target)) {
                    return Err(fail(
                        entry,
                        ParseErrorKind::UnresolvedSubstitution(target.to_string()),
                    ));
                }
            }
            if symbols.insert(entry.symbol.as_str(), id).is_some() {
                return Err(fail(entry, ParseErrorKind::DuplicateSymbol(entry.symbol.clone())));
            }
        }
        Ok(())
    }
}

fn check_mirror(entry: &Entry, config: &CompilerConfig) -> Result<(), ParseErrorKind> {
    if entry.virtual_mirror.is_some() {
        return Err(ParseErrorKind::AlreadySet("virtual mirror"));
    }
    if entry.name.starts_with(config.virtual_prefix.as_str()) {
        return Err(ParseErrorKind::AlreadyVirtual);
    }
    Ok(())
}

fn add_alias(entry: &mut Entry, alias: &str) {
    if entry.kind == EntryKind::Address {
        let domain = entry.domain().to_string();
        entry.candidates.push(Candidate::new(alias, domain));
        return;
    }
    let alias = alias.strip_prefix('_').unwrap_or(alias);
    let suffix = format!("_{}", entry.name);
    let added: Vec<Candidate> = entry
        .candidates
        .iter()
        .filter_map(|c| {
            c.name.strip_suffix(suffix.as_str()).map(|stem| {
                Candidate::new(format!("{stem}_{alias}"), c.domain.as_str())
            })
        })
        .collect();
    for candidate in added {
        if !entry.candidates.contains(&candidate) {
            entry.candidates.push(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Access;

    fn parse_default(text: &str) -> Result<Forest, ParseError> {
        let config = CompilerConfig::with_defaults();
        parse(text, &config, config.id_layout().unwrap())
    }

    fn error_kind(text: &str) -> (usize, ParseErrorKind) {
        let err = parse_default(text).unwrap_err();
        (err.line, err.kind)
    }

    #[test]
    fn test_tree_and_symbols() {
        let forest = parse_default(
            "\
LW_FOO
    _A
        _DISABLE
        _ENABLE
    _B
LW_PMC_BOOT_0
",
        )
        .unwrap();
        let names: Vec<_> = forest.entries().iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(
            names,
            [
                "LWHAL_FOO",
                "LWHAL_FOO_A",
                "LWHAL_FOO_A_DISABLE",
                "LWHAL_FOO_A_ENABLE",
                "LWHAL_FOO_B",
                "LWHAL_PMC_BOOT_0",
            ]
        );
        assert_eq!(forest.roots(), &[0, 5]);
        assert_eq!(forest.get(0).children, vec![1, 4]);
        assert_eq!(forest.get(3).candidates[0].name, "LW_FOO_A_ENABLE");
        assert_eq!(forest.get(3).kind, EntryKind::Value);
        assert_eq!(forest.get(3).access, Access::Any);
    }

    #[test]
    fn test_packed_ids() {
        let forest = parse_default("LW_A\nLW_B\n  _X\n  _Y\n    _ON\n").unwrap();
        let ids: Vec<u32> = forest.entries().iter().map(|e| e.packed_id).collect();
        assert_eq!(ids, [0x4001_0000, 0x4002_0000, 0x8002_0100, 0x8002_0200, 0xc002_0201]);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let forest = parse_default("# header\n\nLW_FOO  # trailing\n\n    _A 4\n").unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest.get(1).dims, vec![ArrayDim::suffix(4)]);
        assert_eq!(forest.get(1).line, 5);
    }

    #[test]
    fn test_natural_ordering_enforced() {
        assert!(parse_default("LW_X\n  _1_CLKS\n  _32_CLKS\n  _256_CLKS\n").is_ok());
        let (line, kind) = error_kind("LW_X\n  _32_CLKS\n  _1_CLKS\n");
        assert_eq!(line, 3);
        assert_eq!(
            kind,
            ParseErrorKind::OutOfOrder {
                previous: "32_CLKS".into(),
                name: "1_CLKS".into()
            }
        );
    }

    #[test]
    fn test_duplicate_name() {
        let (line, kind) = error_kind("LW_X\nLW_X\n");
        assert_eq!(line, 2);
        assert_eq!(kind, ParseErrorKind::DuplicateName("LW_X".into()));
    }

    #[test]
    fn test_ordering_resets_under_new_parent() {
        assert!(parse_default("LW_A\n  _Z\nLW_B\n  _A\n").is_ok());
    }

    #[test]
    fn test_indentation_errors() {
        assert_eq!(error_kind("LW_A\n    _X\n  _Y\n"), (3, ParseErrorKind::BadIndent));
        assert_eq!(
            error_kind("LW_A\n _B\n  _C\n   _D\n"),
            (4, ParseErrorKind::TooDeep)
        );
        assert_eq!(error_kind("LW_A\n# ok\n\t_B\n"), (3, ParseErrorKind::TabCharacter));
    }

    #[test]
    fn test_tab_in_comment_is_rejected() {
        assert_eq!(error_kind("LW_A # a\tb\n"), (1, ParseErrorKind::TabCharacter));
    }

    #[test]
    fn test_address_prefix_required() {
        assert_eq!(
            error_kind("FOO\n"),
            (1, ParseErrorKind::MissingSourcePrefix("LW_".into()))
        );
    }

    #[test]
    fn test_directives_parse() {
        let directives = parse_directives(
            "2 -domain GR -replace_array GPCx=GPC%d 8 -replace_array TPCx*=LW_TPC_STRIDE 4 \
             -replace_string CHIP={DEVICE} -alias LW_BAR -cap LWHAL_CAP_X -virtual_export"
                .split_whitespace(),
        )
        .unwrap();
        assert_eq!(
            directives,
            [
                Directive::ArrayLimit(2),
                Directive::Domain("GR".into()),
                Directive::ReplaceArray {
                    old: "GPCx".into(),
                    new: "GPC%d".into(),
                    limit: 8
                },
                Directive::ReplaceStride {
                    old: "TPCx".into(),
                    stride: "LW_TPC_STRIDE".into(),
                    limit: 4
                },
                Directive::ReplaceString {
                    old: "CHIP".into(),
                    new: "{DEVICE}".into()
                },
                Directive::Alias("LW_BAR".into()),
                Directive::Cap("LWHAL_CAP_X".into()),
                Directive::VirtualExport,
            ]
        );
    }

    #[test]
    fn test_directive_errors() {
        assert_eq!(
            parse_directives(["-bogus"]),
            Err(ParseErrorKind::InvalidDirective("-bogus".into()))
        );
        assert_eq!(
            parse_directives(["-domain"]),
            Err(ParseErrorKind::MissingArgument("-domain".into()))
        );
        assert_eq!(
            parse_directives(["0"]),
            Err(ParseErrorKind::BadArrayLimit("0".into()))
        );
        assert!(matches!(
            parse_directives(["-replace_array", "GPCx", "8"]),
            Err(ParseErrorKind::MalformedArgument { .. })
        ));
    }

    #[test]
    fn test_directive_level_checks() {
        assert_eq!(
            error_kind("LW_A\n  _B -domain GR\n"),
            (2, ParseErrorKind::InvalidDirective("-domain".into()))
        );
        assert_eq!(
            error_kind("LW_A -domain GR -domain FB\n"),
            (1, ParseErrorKind::AlreadySet("domain"))
        );
        assert_eq!(
            error_kind("LW_A -cap LWHAL_CAP_X -cap LWHAL_CAP_Y\n"),
            (1, ParseErrorKind::AlreadySet("capability"))
        );
        assert!(matches!(
            error_kind("LW_A -cap OTHER_CAP\n").1,
            ParseErrorKind::BadCapPrefix { .. }
        ));
    }

    #[test]
    fn test_virtual_directives() {
        let forest = parse_default("LW_PMC -virtual_mirror LW_VIRTUAL_MC\nLW_PTOP -virtual_export\n")
            .unwrap();
        let mirror = forest.get(0).virtual_mirror.as_ref().unwrap();
        assert_eq!((mirror.from.as_str(), mirror.to.as_str()), ("LW_PMC", "LW_VIRTUAL_MC"));
        let mirror = forest.get(1).virtual_mirror.as_ref().unwrap();
        assert_eq!((mirror.from.as_str(), mirror.to.as_str()), ("LW_", "LW_VIRTUAL_"));

        assert_eq!(
            error_kind("LW_PMC -virtual_export -virtual_export\n").1,
            ParseErrorKind::AlreadySet("virtual mirror")
        );
        assert_eq!(
            error_kind("LW_VIRTUAL_MC -virtual_export\n").1,
            ParseErrorKind::AlreadyVirtual
        );
        assert!(matches!(
            error_kind("LW_PMC -virtual_mirror LW_MC\n").1,
            ParseErrorKind::BadVirtualPrefix { .. }
        ));
    }

    #[test]
    fn test_aliases_and_domain() {
        let forest = parse_default(
            "LW_PFB_CFG -alias LW_PFB_CFG0 -domain FB\n  _MODE -alias _MODE_ALT\n    _ON\n",
        )
        .unwrap();
        let names = |id: EntryId| -> Vec<(String, String)> {
            forest
                .get(id)
                .candidates
                .iter()
                .map(|c| (c.name.clone(), c.domain.clone()))
                .collect()
        };
        assert_eq!(
            names(0),
            [
                ("LW_PFB_CFG".to_string(), "FB".to_string()),
                ("LW_PFB_CFG0".to_string(), "FB".to_string())
            ]
        );
        let field: Vec<String> = names(1).into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            field,
            [
                "LW_PFB_CFG_MODE",
                "LW_PFB_CFG0_MODE",
                "LW_PFB_CFG_MODE_ALT",
                "LW_PFB_CFG0_MODE_ALT"
            ]
        );
        assert_eq!(names(2).len(), 4);
        assert!(names(2).iter().all(|(n, d)| n.ends_with("_ON") && d == "FB"));
    }

    #[test]
    fn test_unresolved_substitution() {
        assert!(parse_default("LW_GPCx_FOO -replace_array GPCx=GPC%d 8\n").is_ok());
        let (line, kind) = error_kind("LW_A\nLW_TPCx_FOO -replace_array GPCx=GPC%d 8\n");
        assert_eq!(line, 2);
        assert_eq!(kind, ParseErrorKind::UnresolvedSubstitution("GPCx".into()));
        assert_eq!(
            error_kind("LW_FOO -replace_string CHIP={device}\n").1,
            ParseErrorKind::UnresolvedSubstitution("CHIP".into())
        );
    }

    #[test]
    fn test_duplicate_public_symbol() {
        let (line, kind) = error_kind("LW_FOO\n  _A\nLW_FOO_A\n");
        assert_eq!(line, 3);
        assert_eq!(kind, ParseErrorKind::DuplicateSymbol("LWHAL_FOO_A".into()));
    }

    #[test]
    fn test_sequence_overflow() {
        let config = CompilerConfig::with_defaults().limits(crate::config::IdLimits {
            max_fields: 1,
            ..Default::default()
        });
        let err = parse("LW_A\n _X\n _Y\n", &config, config.id_layout().unwrap()).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(
            err.kind,
            ParseErrorKind::SequenceOverflow {
                kind: "field",
                max: 1
            }
        );
    }

    #[test]
    fn test_ids_are_stable() {
        let text = "LW_A 4\n  _X\nLW_B\n  _Y 2\n    _Z\n";
        let a = parse_default(text).unwrap();
        let b = parse_default(text).unwrap();
        let ids = |f: &Forest| f.entries().iter().map(|e| e.packed_id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        let mut unique = ids(&a);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), a.len());
    }
}
