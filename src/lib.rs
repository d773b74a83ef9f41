/*!
`gedgraph` parses GEDCOM genealogy files into an in-memory, queryable graph.

Two halves: a GEDCOM ingestion pipeline (tokenizer, record assembler, and an
optional parallel pipeline for large files) and a graph store with a
secondary index, optional SQL+KV hybrid backing, bounded caches, and a query
engine (ancestry, descent, relationship classification, shortest path,
lowest common ancestors, and graph-wide metrics).

Basic example:

```rust
use gedgraph::{Gedcom, ParseOptions, GraphBuilderOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = "0 @I1@ INDI\n1 NAME John /Doe/\n1 SEX M\n0 TRLR";
    let gedcom = Gedcom::parse(source, &ParseOptions::new())?;
    let (graph, warnings) = gedcom.build_graph(&GraphBuilderOptions::new());

    println!("parsed {} nodes ({} warnings)", graph.node_count(), warnings.len());
    Ok(())
}
```

This crate has an optional `"json"` feature that derives `serde`
`Serialize`/`Deserialize` on the graph's node and edge types, and a
`"hybrid"` feature (on by default) that adds a SQLite + sled-backed
secondary store for datasets too large to keep fully resident (see
[`storage`]).

## Query example

```rust
use gedgraph::{Gedcom, ParseOptions, GraphBuilderOptions};
use gedgraph::query::{relationship, path};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = "\
0 @I1@ INDI\n1 NAME Grandparent\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME Parent\n1 FAMC @F1@\n1 FAMS @F2@\n\
0 @I3@ INDI\n1 NAME Grandchild\n1 FAMC @F2@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
0 @F2@ FAM\n1 HUSB @I2@\n1 CHIL @I3@\n";

    let gedcom = Gedcom::parse(source, &ParseOptions::new())?;
    let (graph, _) = gedcom.build_graph(&GraphBuilderOptions::new());

    let grandparent = graph.id_for_xref("@I1@").unwrap();
    let grandchild = graph.id_for_xref("@I3@").unwrap();

    assert_eq!(
        relationship::classify(&graph, grandchild, grandparent),
        relationship::Relationship::Grandparent
    );
    // The shortest path threads through both FAM nodes (I1-F1-I2-F2-I3),
    // since path-finding walks the raw graph rather than the collapsed
    // individual-to-individual relationship view.
    let (shortest, _) = path::shortest_path(&graph, grandparent, grandchild).unwrap();
    assert_eq!(shortest.len(), 5);
    Ok(())
}
```
*/

#![warn(missing_docs)]

pub mod builder;
pub mod cache;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod parallel;
pub mod query;
pub mod record;
#[cfg(feature = "hybrid")]
pub mod storage;
pub mod tokenizer;

pub use builder::{Gedcom, GraphBuilderOptions, ParseOptions};
pub use error::{ErrorList, GedcomError, GedcomWarning, GraphError, WarningKind};
pub use graph::{Edge, EdgeKind, Graph, Node, NodeData, NodeKind};
