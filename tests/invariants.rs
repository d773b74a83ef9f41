//! Integration coverage for the graph-level invariants not already
//! exercised by unit tests: paired family-membership edges, the xref/id
//! bijection, node removal cleanup, and edge add/remove reversibility.

use gedgraph::{EdgeKind, Gedcom, GraphBuilderOptions, ParseOptions};

fn build(text: &str) -> gedgraph::Graph {
    let gedcom = Gedcom::parse(text, &ParseOptions::new()).unwrap();
    gedcom.build_graph(&GraphBuilderOptions::new()).0
}

#[test]
fn family_membership_edges_are_paired() {
    let graph = build(
        "0 @I1@ INDI\n1 NAME Husband\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME Wife\n1 FAMS @F1@\n\
0 @I3@ INDI\n1 NAME Child\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 WIFE @I2@\n1 CHIL @I3@\n",
    );
    let husband = graph.id_for_xref("@I1@").unwrap();
    let wife = graph.id_for_xref("@I2@").unwrap();
    let child = graph.id_for_xref("@I3@").unwrap();
    let fam = graph.id_for_xref("@F1@").unwrap();

    assert!(graph.out_edges(fam).iter().any(|e| e.kind == EdgeKind::Husb && e.to == husband));
    assert!(graph.out_edges(husband).iter().any(|e| e.kind == EdgeKind::Fams && e.to == fam));

    assert!(graph.out_edges(fam).iter().any(|e| e.kind == EdgeKind::Wife && e.to == wife));
    assert!(graph.out_edges(wife).iter().any(|e| e.kind == EdgeKind::Fams && e.to == fam));

    assert!(graph.out_edges(fam).iter().any(|e| e.kind == EdgeKind::Chil && e.to == child));
    assert!(graph.out_edges(child).iter().any(|e| e.kind == EdgeKind::Famc && e.to == fam));
}

#[test]
fn xref_and_internal_id_form_a_bijection() {
    let graph = build("0 @I1@ INDI\n1 NAME Jane /Doe/\n0 TRLR");
    let id = graph.id_for_xref("@I1@").unwrap();
    let node = graph.get_by_id(id).unwrap();
    assert_eq!(node.xref, "@I1@");
    assert_eq!(graph.get_by_xref("@I1@").unwrap().internal_id, id);
}

#[test]
fn removing_a_node_clears_every_incident_edge() {
    let graph = build(
        "0 @I1@ INDI\n1 NAME Parent\n1 FAMS @F1@\n\
0 @I2@ INDI\n1 NAME Child\n1 FAMC @F1@\n\
0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n",
    );
    let parent = graph.id_for_xref("@I1@").unwrap();
    let fam = graph.id_for_xref("@F1@").unwrap();

    graph.remove_node("@I1@").unwrap();

    assert!(graph.get_by_xref("@I1@").is_none());
    assert!(graph.out_edges(fam).iter().all(|e| e.to != parent));
    assert!(graph.in_edges(fam).iter().all(|e| e.from != parent));
}

#[test]
fn add_edge_then_remove_edge_restores_the_prior_state() {
    let graph = build(
        "0 @I1@ INDI\n1 NAME A\n\
0 @I2@ INDI\n1 NAME B\n",
    );
    let a = graph.id_for_xref("@I1@").unwrap();
    let b = graph.id_for_xref("@I2@").unwrap();

    let before_out = graph.out_edges(a);
    let before_in = graph.in_edges(b);

    graph.add_edge(EdgeKind::Spouse, a, b).unwrap();
    assert!(graph.out_edges(a).iter().any(|e| e.kind == EdgeKind::Spouse && e.to == b));

    graph.remove_edge(EdgeKind::Spouse, a, b).unwrap();
    assert_eq!(graph.out_edges(a), before_out);
    assert_eq!(graph.in_edges(b), before_in);
}
