//! Chained-setter option structs and the top-level parse-then-build facade.
//!
//! `ParseOptions`/`GraphBuilderOptions` follow the teacher's referenced (but
//! not retrieved) `GedcomBuilder` convention: small structs with
//! `self`-returning setters, constructed with `::new()` and configured
//! fluently before use.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ErrorList, GedcomError, GedcomWarning, WarningKind};
use crate::graph::edge::EdgeKind;
use crate::graph::node::{
    EventData, FamilyData, IndividualData, NodeData, NoteData, RepositoryData, SourceData,
};
use crate::graph::Graph;
use crate::record::{BaseRecord, Record, RecordKind, RecordTree};
use crate::{parallel, tokenizer::MAX_LINE_LENGTH};

/// Tokenizer/assembler knobs (C1/C2/C3).
#[derive(Clone, Debug)]
pub struct ParseOptions {
    strict_mode: bool,
    max_line_length: usize,
    parallel_threshold: usize,
    workers: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict_mode: false,
            max_line_length: MAX_LINE_LENGTH,
            parallel_threshold: parallel::PARALLEL_THRESHOLD_BYTES,
            workers: 4,
        }
    }
}

impl ParseOptions {
    /// Creates options with the default knobs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true`, unrecognized tags are reported as errors rather than
    /// warnings. Off by default, matching GEDCOM's open tag set.
    #[must_use]
    pub fn strict_mode(mut self, value: bool) -> Self {
        self.strict_mode = value;
        self
    }

    /// Overrides the maximum accepted physical line length.
    #[must_use]
    pub fn max_line_length(mut self, value: usize) -> Self {
        self.max_line_length = value;
        self
    }

    /// Overrides the input-size threshold above which parsing uses the
    /// parallel pipeline.
    #[must_use]
    pub fn parallel_threshold(mut self, value: usize) -> Self {
        self.parallel_threshold = value;
        self
    }

    /// Overrides the tokenizer worker count used above the threshold.
    #[must_use]
    pub fn workers(mut self, value: usize) -> Self {
        self.workers = value;
        self
    }

    #[must_use]
    pub(crate) fn is_strict(&self) -> bool {
        self.strict_mode
    }
}

/// Graph-builder knobs (C5-C8).
#[derive(Clone, Debug)]
pub struct GraphBuilderOptions {
    validate_references: bool,
    ignore_unknown_tags: bool,
    derive_relationship_edges: bool,
    node_cache_capacity: usize,
    xref_cache_capacity: usize,
    query_cache_capacity: usize,
    hybrid_store_path: Option<PathBuf>,
}

impl Default for GraphBuilderOptions {
    fn default() -> Self {
        GraphBuilderOptions {
            validate_references: true,
            ignore_unknown_tags: true,
            derive_relationship_edges: true,
            node_cache_capacity: 50_000,
            xref_cache_capacity: 25_000,
            query_cache_capacity: 5_000,
            hybrid_store_path: None,
        }
    }
}

impl GraphBuilderOptions {
    /// Creates options with the default knobs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When `true` (the default), a reference to an xref with no matching
    /// record is reported as [`WarningKind::DanglingReference`] and the
    /// edge is dropped, rather than being added unchecked.
    #[must_use]
    pub fn validate_references(mut self, value: bool) -> Self {
        self.validate_references = value;
        self
    }

    /// When `true` (the default), tags outside the recognized set are
    /// silently skipped instead of surfaced as warnings.
    #[must_use]
    pub fn ignore_unknown_tags(mut self, value: bool) -> Self {
        self.ignore_unknown_tags = value;
        self
    }

    /// When `true` (the default), `Parent`/`Child`/`Sibling`/`Spouse` edges
    /// are computed from `FAM` membership after the core graph is built.
    #[must_use]
    pub fn derive_relationship_edges(mut self, value: bool) -> Self {
        self.derive_relationship_edges = value;
        self
    }

    /// Overrides the node LRU cache capacity (C8).
    #[must_use]
    pub fn node_cache_capacity(mut self, value: usize) -> Self {
        self.node_cache_capacity = value;
        self
    }

    /// Overrides the xref LRU cache capacity (C8).
    #[must_use]
    pub fn xref_cache_capacity(mut self, value: usize) -> Self {
        self.xref_cache_capacity = value;
        self
    }

    /// Overrides the query result LRU cache capacity (C10).
    #[must_use]
    pub fn query_cache_capacity(mut self, value: usize) -> Self {
        self.query_cache_capacity = value;
        self
    }

    /// Sets the directory the hybrid relational/KV store is opened from.
    /// Only meaningful when building with the `hybrid` feature.
    #[must_use]
    pub fn hybrid_store_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.hybrid_store_path = Some(value.into());
        self
    }

    #[must_use]
    pub(crate) fn node_cache_capacity_value(&self) -> usize {
        self.node_cache_capacity
    }

    #[must_use]
    pub(crate) fn xref_cache_capacity_value(&self) -> usize {
        self.xref_cache_capacity
    }

    #[must_use]
    pub(crate) fn query_cache_capacity_value(&self) -> usize {
        self.query_cache_capacity
    }

    #[must_use]
    pub(crate) fn hybrid_store_path_value(&self) -> Option<&PathBuf> {
        self.hybrid_store_path.as_ref()
    }
}

/// A parsed-but-not-yet-graphed GEDCOM document: the record tree plus any
/// warnings collected while assembling it.
#[derive(Debug)]
pub struct Gedcom {
    /// The assembled record tree (C2/C4).
    pub tree: RecordTree,
    /// Non-fatal issues collected while tokenizing and assembling.
    pub warnings: ErrorList,
}

impl Gedcom {
    /// Parses GEDCOM text into a record tree.
    ///
    /// # Errors
    ///
    /// Returns a [`GedcomError`] for a fatal tokenizer failure.
    pub fn parse(text: &str, options: &ParseOptions) -> Result<Self, GedcomError> {
        let _ = options.is_strict(); // strict-mode tag policy lives in build_graph
        let (tree, warnings) = parallel::parse(text, options.workers)?;
        Ok(Gedcom { tree, warnings })
    }

    /// Parses raw bytes, sniffing the encoding first (C1).
    ///
    /// # Errors
    ///
    /// Returns a [`GedcomError`] for a fatal tokenizer failure.
    pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Self, GedcomError> {
        let (text, _had_bom) = crate::tokenizer::decode(bytes);
        Self::parse(&text, options)
    }

    /// Builds the graph store from this document's records (C5).
    #[must_use]
    pub fn build_graph(&self, options: &GraphBuilderOptions) -> (Graph, ErrorList) {
        build_graph(&self.tree, options)
    }
}

fn note_refs_as_edges(
    graph: &Graph,
    from: u32,
    refs: &[crate::record::NoteRef],
    warnings: &mut ErrorList,
    validate: bool,
) {
    for note in refs {
        if let crate::record::NoteRef::Xref(xref) = note {
            link(graph, from, xref, EdgeKind::Note, warnings, validate);
        }
    }
}

fn source_refs_as_edges(
    graph: &Graph,
    from: u32,
    refs: &[crate::record::SourceRef],
    warnings: &mut ErrorList,
    validate: bool,
) {
    for sour in refs {
        link(graph, from, &sour.xref, EdgeKind::Sour, warnings, validate);
    }
}

fn link(
    graph: &Graph,
    from: u32,
    to_xref: &str,
    kind: EdgeKind,
    warnings: &mut ErrorList,
    validate: bool,
) {
    match graph.id_for_xref(to_xref) {
        Some(to) => {
            let _ = graph.add_edge(kind, from, to);
        }
        None if validate => {
            warnings.push(GedcomWarning::new(
                0,
                WarningKind::DanglingReference {
                    xref: to_xref.to_string(),
                    edge_type: kind.tag().to_string(),
                },
            ));
        }
        None => {}
    }
}

/// Builds a [`Graph`] from an assembled [`RecordTree`] (C5), applying
/// `options` for reference validation and derived-edge computation.
#[must_use]
pub fn build_graph(tree: &RecordTree, options: &GraphBuilderOptions) -> (Graph, ErrorList) {
    let graph = Graph::new();
    let mut warnings = ErrorList::new();
    let validate = options.validate_references;

    for record in tree.canonical() {
        if !options.ignore_unknown_tags {
            warn_unknown_tags(record, &mut warnings);
        }
        let Some(xref) = record.xref.clone() else {
            continue;
        };
        let data = match record.kind {
            RecordKind::Individual => NodeData::Individual(individual_data(record)),
            RecordKind::Family => NodeData::Family(family_data(record)),
            RecordKind::Note => NodeData::Note(NoteData {
                text: record.root.value.clone(),
            }),
            RecordKind::Source => NodeData::Source(source_data(record)),
            RecordKind::Repository => NodeData::Repository(repository_data(record)),
            RecordKind::Other(_) => continue,
        };
        let _ = graph.add_node(xref, data);
    }

    // An individual's own FAMC/FAMS lines are the other half of family
    // membership; the family-side pass below resolves these when the
    // family record exists, but a reference to a family that was never
    // declared is only visible from here.
    for record in tree.canonical() {
        let (Some(_xref), RecordKind::Individual) = (&record.xref, &record.kind) else {
            continue;
        };
        let base = BaseRecord::new(&record.root);
        for famc in base.famc_refs() {
            if validate && graph.id_for_xref(famc).is_none() {
                warnings.push(GedcomWarning::new(
                    0,
                    WarningKind::DanglingReference {
                        xref: famc.to_string(),
                        edge_type: EdgeKind::Famc.tag().to_string(),
                    },
                ));
            }
        }
        for fams in base.fams_refs() {
            if validate && graph.id_for_xref(fams).is_none() {
                warnings.push(GedcomWarning::new(
                    0,
                    WarningKind::DanglingReference {
                        xref: fams.to_string(),
                        edge_type: EdgeKind::Fams.tag().to_string(),
                    },
                ));
            }
        }
    }

    for record in tree.canonical() {
        let (Some(xref), RecordKind::Family) = (&record.xref, &record.kind) else {
            continue;
        };
        let Some(from) = graph.id_for_xref(xref) else {
            continue;
        };
        let base = BaseRecord::new(&record.root);
        if let Some(husb) = base.husband() {
            link(&graph, from, husb, EdgeKind::Husb, &mut warnings, validate);
            if let Some(h) = graph.id_for_xref(husb) {
                let _ = graph.add_edge(EdgeKind::Fams, h, from);
            }
        }
        if let Some(wife) = base.wife() {
            link(&graph, from, wife, EdgeKind::Wife, &mut warnings, validate);
            if let Some(w) = graph.id_for_xref(wife) {
                let _ = graph.add_edge(EdgeKind::Fams, w, from);
            }
        }
        for child in base.children() {
            link(&graph, from, child, EdgeKind::Chil, &mut warnings, validate);
            if let Some(c) = graph.id_for_xref(child) {
                let _ = graph.add_edge(EdgeKind::Famc, c, from);
            }
        }
    }

    for record in tree.canonical() {
        let Some(xref) = &record.xref else { continue };
        let Some(from) = graph.id_for_xref(xref) else {
            continue;
        };
        let base = BaseRecord::new(&record.root);
        note_refs_as_edges(&graph, from, &base.notes(), &mut warnings, validate);
        source_refs_as_edges(&graph, from, &base.sources(), &mut warnings, validate);
        if record.kind == RecordKind::Source {
            if let Some(repo) = record.root.child_value("REPO") {
                link(&graph, from, repo, EdgeKind::Repo, &mut warnings, validate);
            }
        }

        let is_family = record.kind == RecordKind::Family;
        if matches!(record.kind, RecordKind::Individual | RecordKind::Family) {
            for (index, event) in base.events(is_family).into_iter().enumerate() {
                let event_xref = format!("{xref}_{}_{index}", event.event_type.tag());
                let event_data = NodeData::Event(EventData {
                    event_type: event.event_type,
                    date: event.date,
                    place: event.place,
                    description: event.description,
                    properties: BTreeMap::new(),
                });
                if let Ok(event_id) = graph.add_node(event_xref, event_data) {
                    let _ = graph.add_edge(EdgeKind::HasEvent, from, event_id);
                }
            }
        }
    }

    if options.derive_relationship_edges {
        derive_relationship_edges(&graph);
    }
    graph.reindex_relationship_flags();

    (graph, warnings)
}

/// Tags recognized on `INDI`/`FAM` records; anything else is reported as
/// [`WarningKind::UnrecognizedTag`] unless the builder is configured to
/// ignore unknown tags.
const KNOWN_RECORD_TAGS: &[&str] = &[
    "NAME", "SEX", "FAMS", "FAMC", "NOTE", "SOUR", "OBJE", "RESN", "REFN", "RIN", "CHAN", "HUSB",
    "WIFE", "CHIL", "TITL", "AUTH", "REPO", "PUBL", "ABBR",
];

fn warn_unknown_tags(record: &Record, warnings: &mut ErrorList) {
    if !matches!(record.kind, RecordKind::Individual | RecordKind::Family) {
        return;
    }
    let event_tags = crate::record::EventType::individual_tags()
        .iter()
        .chain(crate::record::EventType::family_tags());
    for child in &record.root.children {
        let tag = child.tag.as_str();
        if KNOWN_RECORD_TAGS.contains(&tag) || event_tags.clone().any(|t| *t == tag) {
            continue;
        }
        warnings.push(GedcomWarning::new(
            0,
            WarningKind::UnrecognizedTag {
                tag: tag.to_string(),
            },
        ));
    }
}

fn individual_data(record: &Record) -> IndividualData {
    let base = BaseRecord::new(&record.root);
    let death_date = base.death_date().map(str::to_string);
    let death_event_present = record.root.child("DEAT").is_some();
    IndividualData {
        name: base.name().map(str::to_string),
        sex: base.sex().map(str::to_string),
        birth_date: base.birth_date().map(str::to_string),
        birth_place: base.birth_place().map(str::to_string),
        death_place: record
            .root
            .child("DEAT")
            .and_then(|d| d.child_value("PLAC"))
            .map(str::to_string),
        living: death_date.is_none() && !death_event_present,
        death_date,
        properties: BTreeMap::new(),
    }
}

fn family_data(record: &Record) -> FamilyData {
    let marr = record.root.child("MARR");
    FamilyData {
        marriage_date: marr.and_then(|m| m.child_value("DATE")).map(str::to_string),
        marriage_place: marr.and_then(|m| m.child_value("PLAC")).map(str::to_string),
        properties: BTreeMap::new(),
    }
}

fn source_data(record: &Record) -> SourceData {
    SourceData {
        title: record.root.child_value("TITL").map(str::to_string),
        author: record.root.child_value("AUTH").map(str::to_string),
        properties: BTreeMap::new(),
    }
}

fn repository_data(record: &Record) -> RepositoryData {
    RepositoryData {
        name: record.root.child_value("NAME").map(str::to_string),
        properties: BTreeMap::new(),
    }
}

/// Computes `Parent`/`Child`/`Sibling`/`Spouse` edges from each family's
/// `HUSB`/`WIFE`/`CHIL` membership (the optional derived edges of spec.md
/// §3).
fn derive_relationship_edges(graph: &Graph) {
    use crate::graph::node::NodeKind;

    for node in graph.all_nodes() {
        if node.kind() != NodeKind::Family {
            continue;
        }
        let fam_id = node.internal_id;
        let out = graph.out_edges(fam_id);
        let husband = out.iter().find(|e| e.kind == EdgeKind::Husb).map(|e| e.to);
        let wife = out.iter().find(|e| e.kind == EdgeKind::Wife).map(|e| e.to);
        let children: Vec<u32> = out
            .iter()
            .filter(|e| e.kind == EdgeKind::Chil)
            .map(|e| e.to)
            .collect();

        if let (Some(h), Some(w)) = (husband, wife) {
            let _ = graph.add_edge(EdgeKind::Spouse, h, w);
            let _ = graph.add_edge(EdgeKind::Spouse, w, h);
        }
        for &child in &children {
            for &parent in [husband, wife].iter().flatten() {
                let _ = graph.add_edge(EdgeKind::Parent, child, parent);
                let _ = graph.add_edge(EdgeKind::Child, parent, child);
            }
        }
        for i in 0..children.len() {
            for j in (i + 1)..children.len() {
                let _ = graph.add_edge(EdgeKind::Sibling, children[i], children[j]);
                let _ = graph.add_edge(EdgeKind::Sibling, children[j], children[i]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "0 @I1@ INDI\n1 NAME Parent /One/\n1 SEX M\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME Parent /Two/\n1 SEX F\n1 FAMS @F1@\n\
0 @I3@ INDI\n1 NAME Child /One/\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n";

    #[test]
    fn builds_parent_child_and_spouse_edges() {
        let gedcom = Gedcom::parse(SAMPLE, &ParseOptions::new()).unwrap();
        let (graph, warnings) = gedcom.build_graph(&GraphBuilderOptions::new());
        assert!(warnings.is_empty());

        let dad = graph.id_for_xref("@I1@").unwrap();
        let mom = graph.id_for_xref("@I2@").unwrap();
        let kid = graph.id_for_xref("@I3@").unwrap();

        assert!(graph
            .out_edges(kid)
            .iter()
            .any(|e| e.kind == EdgeKind::Parent && e.to == dad));
        assert!(graph
            .out_edges(dad)
            .iter()
            .any(|e| e.kind == EdgeKind::Child && e.to == kid));
        assert!(graph
            .out_edges(dad)
            .iter()
            .any(|e| e.kind == EdgeKind::Spouse && e.to == mom));
    }

    #[test]
    fn dangling_reference_is_dropped_with_warning() {
        let text = "0 @I1@ INDI\n1 NAME Orphan /X/\n1 FAMC @F9@\n";
        let gedcom = Gedcom::parse(text, &ParseOptions::new()).unwrap();
        let (_graph, warnings) = gedcom.build_graph(&GraphBuilderOptions::new());
        assert!(warnings
            .iter()
            .any(|w| matches!(w.kind, WarningKind::DanglingReference { .. })));
    }
}
