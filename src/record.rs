//! The record tree (C2 Record Assembler) and the typed record model (C4)
//! built on top of it.
//!
//! A [`GedcomLine`] tree mirrors the hierarchical shape of a GEDCOM file
//! directly: each record kind's typed accessors (`name()`, `birth_date()`,
//! `events()`, ...) work by scanning a record's line children rather than by
//! a dedicated recursive-descent parser per tag, per the data model in
//! spec.md §3/§4.4.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ErrorList, GedcomError, GedcomWarning, WarningKind};
use crate::tokenizer::{LineToken, Tokenizer};

/// A dynamic value for GEDCOM's open tag set and synthesized event
/// properties (spec.md §9 "Dynamic maps in records / properties").
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// A bare string value.
    Str(String),
    /// An integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
    /// A time-like value, stored verbatim (no date arithmetic is performed;
    /// see spec.md Non-goals).
    Time(String),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A nested string-keyed map.
    Map(BTreeMap<String, Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Time(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(_) => write!(f, "{{..}}"),
        }
    }
}

/// One line of a GEDCOM hierarchy: `level`, optional `xref`, `tag`, `value`,
/// and its parsed children.
///
/// Invariant: every direct child's level equals `self.level + 1` in a
/// well-formed tree; the assembler reattaches out-of-range children to the
/// deepest feasible ancestor and records a [`WarningKind::HierarchyGap`]
/// rather than rejecting the input (spec.md §4.2).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct GedcomLine {
    /// Nesting depth; top-level records are level 0.
    pub level: u8,
    /// The tag, e.g. `INDI`, `NAME`, `BIRT`.
    pub tag: String,
    /// The (possibly CONC/CONT-merged) value.
    pub value: String,
    /// The cross-reference id this line declares, if any.
    pub xref: Option<String>,
    /// Parsed child lines, in file order.
    pub children: Vec<GedcomLine>,
}

impl GedcomLine {
    /// Returns the first direct child with the given tag, if any.
    #[must_use]
    pub fn child(&self, tag: &str) -> Option<&GedcomLine> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// Returns all direct children with the given tag.
    pub fn children_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a GedcomLine> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Returns the value of the first direct child with the given tag.
    #[must_use]
    pub fn child_value(&self, tag: &str) -> Option<&str> {
        self.child(tag).map(|c| c.value.as_str())
    }
}

/// The five top-level record kinds the graph store materializes as nodes,
/// plus a catch-all for everything else a GEDCOM file carries (HEAD, SUBM,
/// SUBN, OBJE, ...), which the parser still retains but the graph builder
/// ignores (spec.md Non-goals: "arbitrary GEDCOM dialect extensions").
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum RecordKind {
    /// `INDI`
    Individual,
    /// `FAM`
    Family,
    /// `NOTE` (and GEDCOM 7 `SNOTE`)
    Note,
    /// `SOUR`
    Source,
    /// `REPO`
    Repository,
    /// Any other top-level tag, carried verbatim.
    Other(String),
}

impl RecordKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "INDI" => RecordKind::Individual,
            "FAM" => RecordKind::Family,
            "NOTE" | "SNOTE" => RecordKind::Note,
            "SOUR" => RecordKind::Source,
            "REPO" => RecordKind::Repository,
            other => RecordKind::Other(other.to_string()),
        }
    }

    /// The GEDCOM tag for this kind, as it appears on the wire.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            RecordKind::Individual => "INDI",
            RecordKind::Family => "FAM",
            RecordKind::Note => "NOTE",
            RecordKind::Source => "SOUR",
            RecordKind::Repository => "REPO",
            RecordKind::Other(tag) => tag.as_str(),
        }
    }
}

/// A single top-level GEDCOM record: an xref (when the record kind has
/// one), its kind, and the parsed line tree rooted at the `0 @XREF@ TAG`
/// line.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    /// The record's cross-reference id, e.g. `@I1@`. `None` for records
    /// that don't carry one (HEAD, TRLR).
    pub xref: Option<String>,
    /// The record kind.
    pub kind: RecordKind,
    /// The full parsed line tree for this record.
    pub root: GedcomLine,
}

/// The output of the record assembler (C2): every top-level record in file
/// order, plus an index from xref to its canonical (last-write-wins) slot.
#[derive(Clone, Debug, Default)]
pub struct RecordTree {
    /// Every top-level record, in file order. A duplicated xref appears
    /// more than once here; `by_xref` always points at the last one.
    pub records: Vec<Record>,
    /// xref -> index into `records` of the record that wins under
    /// last-write-wins duplicate handling.
    pub by_xref: std::collections::HashMap<String, usize>,
}

impl RecordTree {
    /// Looks up a record by xref, honoring last-write-wins on duplicates.
    #[must_use]
    pub fn get(&self, xref: &str) -> Option<&Record> {
        self.by_xref.get(xref).map(|&i| &self.records[i])
    }

    /// Iterates the canonical (non-superseded) records in file order.
    pub fn canonical(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().enumerate().filter_map(move |(i, r)| {
            let canonical_index = r.xref.as_deref().and_then(|x| self.by_xref.get(x));
            match canonical_index {
                Some(&idx) if idx == i => Some(r),
                Some(_) => None,
                None => Some(r),
            }
        })
    }

    /// Iterates canonical records of a specific kind.
    pub fn of_kind<'a>(&'a self, kind: &'a RecordKind) -> impl Iterator<Item = &'a Record> {
        self.canonical().filter(move |r| &r.kind == kind)
    }
}

/// Assembles a stream of [`LineToken`]s into a [`RecordTree`] (C2).
///
/// Maintains a stack of open parents keyed by level, per spec.md §4.2:
/// pops while the stack top's level is `>=` the incoming line's level,
/// attaches `CONC`/`CONT` to the nearest ancestor's value instead of as a
/// distinct child, and finalizes a top-level record whenever the stack
/// empties out at level 0. Malformed nesting produces a
/// [`WarningKind::HierarchyGap`] and reattaches to the deepest feasible
/// ancestor rather than aborting.
pub struct Assembler {
    stack: Vec<GedcomLine>,
    records: Vec<Record>,
    by_xref: std::collections::HashMap<String, usize>,
    warnings: ErrorList,
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler {
    /// Creates an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Assembler {
            stack: Vec::new(),
            records: Vec::new(),
            by_xref: std::collections::HashMap::new(),
            warnings: ErrorList::new(),
        }
    }

    /// Feeds one tokenized line into the assembler.
    pub fn feed(&mut self, tok: LineToken) {
        while let Some(top) = self.stack.last() {
            if top.level >= tok.level {
                let finished = self.stack.pop().expect("checked non-empty above");
                self.attach(finished);
            } else {
                break;
            }
        }

        if tok.tag == "CONC" || tok.tag == "CONT" {
            if let Some(top) = self.stack.last_mut() {
                if tok.tag == "CONT" {
                    top.value.push('\n');
                }
                top.value.push_str(&tok.value);
            }
            return;
        }

        if let Some(top) = self.stack.last() {
            if tok.level > top.level + 1 {
                self.warnings.push(GedcomWarning::new(
                    tok.line,
                    WarningKind::HierarchyGap {
                        found: tok.level,
                        attached_at: top.level,
                    },
                ));
            }
        }

        self.stack.push(GedcomLine {
            level: tok.level,
            tag: tok.tag,
            value: tok.value,
            xref: tok.xref,
            children: Vec::new(),
        });
    }

    fn attach(&mut self, finished: GedcomLine) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(finished);
            return;
        }
        let kind = RecordKind::from_tag(&finished.tag);
        if kind.tag() == "TRLR" {
            return;
        }
        if let Some(xref) = finished.xref.clone() {
            if self.by_xref.contains_key(&xref) {
                self.warnings.push(GedcomWarning::new(
                    0,
                    WarningKind::DuplicateXref { xref: xref.clone() },
                ));
            }
            self.by_xref.insert(xref, self.records.len());
        }
        self.records.push(Record {
            xref: finished.xref.clone(),
            kind,
            root: finished,
        });
    }

    /// Unwinds any still-open lines and returns the finished tree.
    pub fn finish(mut self) -> (RecordTree, ErrorList) {
        while let Some(top) = self.stack.pop() {
            if let Some(parent) = self.stack.last_mut() {
                parent.children.push(top);
            } else {
                let kind = RecordKind::from_tag(&top.tag);
                if kind.tag() != "TRLR" {
                    if let Some(xref) = top.xref.clone() {
                        self.by_xref.insert(xref, self.records.len());
                    }
                    self.records.push(Record {
                        xref: top.xref.clone(),
                        kind,
                        root: top,
                    });
                }
            }
        }
        (
            RecordTree {
                records: self.records,
                by_xref: self.by_xref,
            },
            self.warnings,
        )
    }
}

/// Tokenizes and assembles a complete GEDCOM document serially (C1 + C2).
///
/// # Errors
///
/// Returns a [`GedcomError`] only for fatal tokenizer failures (an
/// over-length line or a line that can't be scanned at all). Everything
/// else is collected into the returned [`ErrorList`].
pub fn parse_serial(text: &str) -> Result<(RecordTree, ErrorList), GedcomError> {
    let mut tokenizer = Tokenizer::new(text);
    let mut assembler = Assembler::new();
    while let Some(tok) = tokenizer.next_line()? {
        assembler.feed(tok);
    }
    Ok(assembler.finish())
}

/// GEDCOM event/attribute types extracted from INDI and FAM event
/// substructures (C4).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum EventType {
    Adoption,
    AdultChristening,
    Annulment,
    Baptism,
    BarMitzvah,
    BasMitzvah,
    Birth,
    Blessing,
    Burial,
    Census,
    Christening,
    Confirmation,
    Cremation,
    Death,
    Divorce,
    DivorceFiled,
    Emigration,
    Engagement,
    FirstCommunion,
    Graduation,
    Immigration,
    Marriage,
    MarriageBann,
    MarriageContract,
    MarriageLicense,
    MarriageSettlement,
    Naturalization,
    Ordination,
    Probate,
    Residence,
    Retired,
    Will,
    /// Any other recognized substructure tag we don't have a dedicated
    /// variant for, keyed by its GEDCOM tag.
    Other(String),
}

impl EventType {
    fn from_individual_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "ADOP" => EventType::Adoption,
            "CHRA" => EventType::AdultChristening,
            "BAPM" => EventType::Baptism,
            "BARM" => EventType::BarMitzvah,
            "BASM" => EventType::BasMitzvah,
            "BIRT" => EventType::Birth,
            "BLES" => EventType::Blessing,
            "BURI" => EventType::Burial,
            "CENS" => EventType::Census,
            "CHR" => EventType::Christening,
            "CONF" => EventType::Confirmation,
            "CREM" => EventType::Cremation,
            "DEAT" => EventType::Death,
            "EMIG" => EventType::Emigration,
            "FCOM" => EventType::FirstCommunion,
            "GRAD" => EventType::Graduation,
            "IMMI" => EventType::Immigration,
            "NATU" => EventType::Naturalization,
            "ORDN" => EventType::Ordination,
            "PROB" => EventType::Probate,
            "RESI" => EventType::Residence,
            "RETI" => EventType::Retired,
            "WILL" => EventType::Will,
            "EVEN" => EventType::Other("EVEN".to_string()),
            _ => return None,
        })
    }

    fn from_family_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "ANUL" => EventType::Annulment,
            "DIV" => EventType::Divorce,
            "DIVF" => EventType::DivorceFiled,
            "ENGA" => EventType::Engagement,
            "MARR" => EventType::Marriage,
            "MARB" => EventType::MarriageBann,
            "MARC" => EventType::MarriageContract,
            "MARL" => EventType::MarriageLicense,
            "MARS" => EventType::MarriageSettlement,
            "EVEN" => EventType::Other("EVEN".to_string()),
            _ => return None,
        })
    }

    /// The tags this variant recognizes on an INDI record.
    #[must_use]
    pub fn individual_tags() -> &'static [&'static str] {
        &[
            "ADOP", "CHRA", "BAPM", "BARM", "BASM", "BIRT", "BLES", "BURI", "CENS", "CHR", "CONF",
            "CREM", "DEAT", "EMIG", "FCOM", "GRAD", "IMMI", "NATU", "ORDN", "PROB", "RESI", "RETI",
            "WILL", "EVEN",
        ]
    }

    /// The tags this variant recognizes on a FAM record.
    #[must_use]
    pub fn family_tags() -> &'static [&'static str] {
        &[
            "ANUL", "DIV", "DIVF", "ENGA", "MARR", "MARB", "MARC", "MARL", "MARS", "EVEN",
        ]
    }

    /// The original GEDCOM tag this variant was extracted from, used to
    /// build an event node's deterministic xref (spec §3:
    /// `"{ownerXref}_{eventTag}_{index}"`).
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            EventType::Adoption => "ADOP",
            EventType::AdultChristening => "CHRA",
            EventType::Annulment => "ANUL",
            EventType::Baptism => "BAPM",
            EventType::BarMitzvah => "BARM",
            EventType::BasMitzvah => "BASM",
            EventType::Birth => "BIRT",
            EventType::Blessing => "BLES",
            EventType::Burial => "BURI",
            EventType::Census => "CENS",
            EventType::Christening => "CHR",
            EventType::Confirmation => "CONF",
            EventType::Cremation => "CREM",
            EventType::Death => "DEAT",
            EventType::Divorce => "DIV",
            EventType::DivorceFiled => "DIVF",
            EventType::Emigration => "EMIG",
            EventType::Engagement => "ENGA",
            EventType::FirstCommunion => "FCOM",
            EventType::Graduation => "GRAD",
            EventType::Immigration => "IMMI",
            EventType::Marriage => "MARR",
            EventType::MarriageBann => "MARB",
            EventType::MarriageContract => "MARC",
            EventType::MarriageLicense => "MARL",
            EventType::MarriageSettlement => "MARS",
            EventType::Naturalization => "NATU",
            EventType::Ordination => "ORDN",
            EventType::Probate => "PROB",
            EventType::Residence => "RESI",
            EventType::Retired => "RETI",
            EventType::Will => "WILL",
            EventType::Other(tag) => tag.as_str(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A reference to a NOTE, either inline text or a pointer to a `NOTE`
/// record's xref.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub enum NoteRef {
    /// Inline note text.
    Inline(String),
    /// A pointer to a shared `NOTE` record.
    Xref(String),
}

/// A `SOUR` citation attached to a record or event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRef {
    /// The cited source's xref.
    pub xref: String,
    /// Page/location detail (`PAGE`), if present.
    pub page: Option<String>,
}

/// One GEDCOM event or attribute substructure, extracted from an
/// individual's or family's line children (C4).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(any(feature = "json", feature = "hybrid"), derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// The event/attribute type.
    pub event_type: EventType,
    /// The raw `DATE` value, if present. No date arithmetic is performed
    /// here (spec.md Non-goals).
    pub date: Option<String>,
    /// The `PLAC` value, if present.
    pub place: Option<String>,
    /// Free-text description / value on the event's own line.
    pub description: Option<String>,
    /// Source citations attached to the event.
    pub sources: Vec<SourceRef>,
    /// Notes attached to the event.
    pub notes: Vec<NoteRef>,
}

fn extract_notes(line: &GedcomLine) -> Vec<NoteRef> {
    line.children_with_tag("NOTE")
        .map(|n| {
            if n.value.starts_with('@') && n.value.ends_with('@') {
                NoteRef::Xref(n.value.clone())
            } else {
                NoteRef::Inline(n.value.clone())
            }
        })
        .collect()
}

fn extract_sources(line: &GedcomLine) -> Vec<SourceRef> {
    line.children_with_tag("SOUR")
        .filter(|s| !s.value.is_empty())
        .map(|s| SourceRef {
            xref: s.value.clone(),
            page: s.child_value("PAGE").map(str::to_string),
        })
        .collect()
}

fn extract_event(line: &GedcomLine, event_type: EventType) -> Event {
    Event {
        event_type,
        date: line.child_value("DATE").map(str::to_string),
        place: line.child_value("PLAC").map(str::to_string),
        description: if line.value.is_empty() {
            None
        } else {
            Some(line.value.clone())
        },
        sources: extract_sources(line),
        notes: extract_notes(line),
    }
}

/// Shared typed accessors over a parsed [`GedcomLine`] tree, per C4's
/// `BaseRecord`.
#[derive(Clone, Debug)]
pub struct BaseRecord<'a> {
    root: &'a GedcomLine,
}

impl<'a> BaseRecord<'a> {
    /// Wraps a record's root line for typed access.
    #[must_use]
    pub fn new(root: &'a GedcomLine) -> Self {
        BaseRecord { root }
    }

    /// The `NAME` value, if present.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.root.child_value("NAME")
    }

    /// The `SEX` value (`M`, `F`, `X`, `U`), if present.
    #[must_use]
    pub fn sex(&self) -> Option<&'a str> {
        self.root.child_value("SEX")
    }

    /// The date of the first `BIRT` event, if present.
    #[must_use]
    pub fn birth_date(&self) -> Option<&'a str> {
        self.root.child("BIRT").and_then(|b| b.child_value("DATE"))
    }

    /// The place of the first `BIRT` event, if present.
    #[must_use]
    pub fn birth_place(&self) -> Option<&'a str> {
        self.root.child("BIRT").and_then(|b| b.child_value("PLAC"))
    }

    /// The date of the first `DEAT` event, if present.
    #[must_use]
    pub fn death_date(&self) -> Option<&'a str> {
        self.root.child("DEAT").and_then(|d| d.child_value("DATE"))
    }

    /// Every `NOTE` directly on this record.
    #[must_use]
    pub fn notes(&self) -> Vec<NoteRef> {
        extract_notes(self.root)
    }

    /// Every `SOUR` citation directly on this record.
    #[must_use]
    pub fn sources(&self) -> Vec<SourceRef> {
        extract_sources(self.root)
    }

    /// `CHIL` xrefs (Family records only).
    #[must_use]
    pub fn children(&self) -> Vec<&'a str> {
        self.root
            .children_with_tag("CHIL")
            .map(|c| c.value.as_str())
            .collect()
    }

    /// `HUSB` xref (Family records only).
    #[must_use]
    pub fn husband(&self) -> Option<&'a str> {
        self.root.child_value("HUSB")
    }

    /// `WIFE` xref (Family records only).
    #[must_use]
    pub fn wife(&self) -> Option<&'a str> {
        self.root.child_value("WIFE")
    }

    /// `FAMC` xrefs (Individual records only): the families this person is
    /// a child in.
    #[must_use]
    pub fn famc_refs(&self) -> Vec<&'a str> {
        self.root
            .children_with_tag("FAMC")
            .map(|c| c.value.as_str())
            .collect()
    }

    /// `FAMS` xrefs (Individual records only): the families this person is
    /// a spouse in.
    #[must_use]
    pub fn fams_refs(&self) -> Vec<&'a str> {
        self.root
            .children_with_tag("FAMS")
            .map(|c| c.value.as_str())
            .collect()
    }

    /// Extracts every recognized event/attribute substructure, choosing the
    /// individual or family tag set based on `is_family`.
    #[must_use]
    pub fn events(&self, is_family: bool) -> Vec<Event> {
        let tags: &[&str] = if is_family {
            EventType::family_tags()
        } else {
            EventType::individual_tags()
        };
        self.root
            .children
            .iter()
            .filter(|c| tags.contains(&c.tag.as_str()))
            .filter_map(|c| {
                let event_type = if is_family {
                    EventType::from_family_tag(&c.tag)
                } else {
                    EventType::from_individual_tag(&c.tag)
                }?;
                Some(extract_event(c, event_type))
            })
            .collect()
    }

    /// The raw line tree backing this record.
    #[must_use]
    pub fn lines(&self) -> &'a GedcomLine {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(text: &str) -> RecordTree {
        let (tree, _warnings) = parse_serial(text).unwrap();
        tree
    }

    #[test]
    fn assembles_flat_record() {
        let tree = assemble("0 @I1@ INDI\n1 NAME John /Doe/\n1 SEX M\n");
        let rec = tree.get("@I1@").unwrap();
        assert_eq!(rec.kind, RecordKind::Individual);
        let base = BaseRecord::new(&rec.root);
        assert_eq!(base.name(), Some("John /Doe/"));
        assert_eq!(base.sex(), Some("M"));
    }

    #[test]
    fn merges_conc_and_cont() {
        // S4: a NOTE with two CONC and one CONT child line.
        let tree = assemble(
            "0 @N1@ NOTE head\n1 CONC conc1\n1 CONC conc2\n1 CONT cont1\n",
        );
        let rec = tree.get("@N1@").unwrap();
        assert_eq!(rec.root.value, "headconc1conc2\ncont1");
        assert!(rec.root.children.is_empty());
    }

    #[test]
    fn reattaches_hierarchy_gaps_and_warns() {
        let (tree, warnings) = parse_serial("0 @I1@ INDI\n1 NAME X\n3 SOUR @S1@\n").unwrap();
        let rec = tree.get("@I1@").unwrap();
        // the level-3 line has no level-2 parent; it's reattached under NAME.
        let name = rec.root.child("NAME").unwrap();
        assert_eq!(name.child_value("SOUR"), Some("@S1@"));
        assert!(warnings
            .iter()
            .any(|w| matches!(w.kind, WarningKind::HierarchyGap { .. })));
    }

    #[test]
    fn duplicate_xref_last_write_wins() {
        let (tree, warnings) =
            parse_serial("0 @I1@ INDI\n1 NAME First\n0 @I1@ INDI\n1 NAME Second\n").unwrap();
        assert_eq!(tree.records.len(), 2);
        let rec = tree.get("@I1@").unwrap();
        assert_eq!(BaseRecord::new(&rec.root).name(), Some("Second"));
        assert!(warnings
            .iter()
            .any(|w| matches!(w.kind, WarningKind::DuplicateXref { .. })));
    }

    #[test]
    fn extracts_family_relationships() {
        let tree = assemble(
            "0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n1 CHIL @I4@\n",
        );
        let rec = tree.get("@F1@").unwrap();
        let base = BaseRecord::new(&rec.root);
        assert_eq!(base.husband(), Some("@I1@"));
        assert_eq!(base.wife(), Some("@I2@"));
        assert_eq!(base.children(), vec!["@I3@", "@I4@"]);
    }

    #[test]
    fn extracts_events_with_nested_fields() {
        let tree = assemble(
            "0 @I1@ INDI\n1 BIRT\n2 DATE 1 JAN 1900\n2 PLAC Springfield\n2 SOUR @S1@\n3 PAGE 4\n",
        );
        let rec = tree.get("@I1@").unwrap();
        let events = BaseRecord::new(&rec.root).events(false);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Birth);
        assert_eq!(events[0].date.as_deref(), Some("1 JAN 1900"));
        assert_eq!(events[0].place.as_deref(), Some("Springfield"));
        assert_eq!(events[0].sources[0].xref, "@S1@");
        assert_eq!(events[0].sources[0].page.as_deref(), Some("4"));
    }
}
