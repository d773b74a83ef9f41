//! Integration coverage for the six end-to-end scenarios: parent/child,
//! siblings, cousins, CONC/CONT continuation, parallel-parse identity, and
//! a hybrid-store close/reopen round trip.

use gedgraph::query::{relationship, Filter};
use gedgraph::{Gedcom, GraphBuilderOptions, ParseOptions};

fn build(text: &str) -> gedgraph::Graph {
    let gedcom = Gedcom::parse(text, &ParseOptions::new()).unwrap();
    gedcom.build_graph(&GraphBuilderOptions::new()).0
}

#[test]
fn parent_child_relationship_and_path() {
    let graph = build(
        "0 @I1@ INDI\n1 NAME Parent\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME Child\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n",
    );
    let parent = graph.id_for_xref("@I1@").unwrap();
    let child = graph.id_for_xref("@I2@").unwrap();

    assert_eq!(relationship::classify(&graph, child, parent), relationship::Relationship::Parent);

    // The path threads through the FAM node: child -FAMC-> F1 -HUSB-> parent,
    // 3 nodes / length 2.
    let (path, _) = gedgraph::query::path::shortest_path(&graph, child, parent).unwrap();
    assert_eq!(path.len(), 3);
}

#[test]
fn siblings_and_has_children_filter() {
    let graph = build(
        "0 @I1@ INDI\n1 NAME Parent\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME SiblingOne\n1 FAMC @F1@\n\
0 @I3@ INDI\n1 NAME SiblingTwo\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n1 CHIL @I3@\n",
    );
    let sib1 = graph.id_for_xref("@I2@").unwrap();
    let sib2 = graph.id_for_xref("@I3@").unwrap();
    assert_eq!(relationship::classify(&graph, sib1, sib2), relationship::Relationship::Sibling);

    let parent = graph.id_for_xref("@I1@").unwrap();
    let ids = Filter::new().has_children(true).execute(&graph);
    assert_eq!(ids, vec![parent]);
}

#[test]
fn cousins_are_classified_with_degree_and_removal() {
    let graph = build(
        "0 @I1@ INDI\n1 NAME Grandparent\n1 FAMS @FG@\n\
0 @P1@ INDI\n1 NAME ParentOne\n1 FAMC @FG@\n1 FAMS @F1@\n\
0 @P2@ INDI\n1 NAME ParentTwo\n1 FAMC @FG@\n1 FAMS @F2@\n\
0 @I4@ INDI\n1 NAME CousinOne\n1 FAMC @F1@\n\
0 @I5@ INDI\n1 NAME CousinTwo\n1 FAMC @F2@\n\
0 @FG@ FAM\n1 HUSB @I1@\n1 CHIL @P1@\n1 CHIL @P2@\n\
0 @F1@ FAM\n1 HUSB @P1@\n1 CHIL @I4@\n\
0 @F2@ FAM\n1 HUSB @P2@\n1 CHIL @I5@\n",
    );
    let c1 = graph.id_for_xref("@I4@").unwrap();
    let c2 = graph.id_for_xref("@I5@").unwrap();
    assert_eq!(
        relationship::classify(&graph, c1, c2),
        relationship::Relationship::Cousin { degree: 1, removed: 0 }
    );
}

#[test]
fn note_continuation_merges_conc_and_cont() {
    let text = "0 @N1@ NOTE head\n1 CONC conc1\n1 CONC conc2\n1 CONT cont1\n0 TRLR";
    let (tree, _) = gedgraph::record::parse_serial(text).unwrap();
    let rec = tree.get("@N1@").unwrap();
    assert_eq!(rec.root.value, "headconc1conc2\ncont1");
}

#[test]
fn serial_and_parallel_parses_agree() {
    let mut text = String::new();
    for i in 0..600 {
        text.push_str(&format!("0 @I{i}@ INDI\n1 NAME Person /{i}/\n1 SEX M\n"));
    }
    let (serial_tree, _) = gedgraph::record::parse_serial(&text).unwrap();
    for workers in [1usize, 2, 4, 8] {
        let gedcom = Gedcom::parse(&text, &ParseOptions::new().workers(workers)).unwrap();
        assert_eq!(gedcom.tree.records.len(), serial_tree.records.len());
    }
}

#[cfg(feature = "hybrid")]
#[test]
fn hybrid_store_round_trips_a_name_prefix_query_after_reopen() {
    use gedgraph::storage::HybridStore;

    let mut text = String::new();
    for i in 0..1000 {
        text.push_str(&format!(
            "0 @I{i}@ INDI\n1 NAME Ancestor /{i}/\n1 SEX {}\n",
            if i % 2 == 0 { "M" } else { "F" }
        ));
    }
    let graph = build(&text);
    let in_memory = Filter::new().name_prefix("Ancestor").execute(&graph);
    assert_eq!(in_memory.len(), 1000);

    let dir = tempfile::tempdir().unwrap();
    {
        let store = HybridStore::open(dir.path()).unwrap();
        store.build(&graph).unwrap();
    }

    let reopened = HybridStore::open(dir.path()).unwrap();
    let hits = reopened.relational.find_by_name_prefix("Ancestor").unwrap();
    assert_eq!(hits.len(), 1000);
}
