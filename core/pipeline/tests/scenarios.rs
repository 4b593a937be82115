//! End-to-end scenario and determinism tests (spec §8).

use deminify_pipeline::{analyze, RunConfig};

fn run(src: &str) -> deminify_pipeline::AnalysisOutput {
    analyze(src, &RunConfig::new("bundle.js")).unwrap()
}

#[test]
fn scenario_pure_cjs_factory_bundle() {
    let src = "var _=Object.create;\n\
               var __=Object.defineProperty;\n\
               var ___=Object.getOwnPropertyNames;\n\
               var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var r=w((e,m)=>{m.exports=1;});\n";
    let out = run(src);

    assert_eq!(out.classify.runtime_helpers.get("w").map(String::as_str), Some("__commonJS"));
    assert_eq!(out.classify.bundler, "esbuild");
    assert_eq!(out.classify.bundler_confidence, "high");
    assert_eq!(out.trace.total_modules, 2);
    assert_eq!(out.trace.modules[0].wrap_kind, "RUNTIME");
    assert_eq!(out.trace.modules[0].statements, vec![0, 1, 2, 3]);
    assert_eq!(out.trace.modules[1].wrap_kind, "CJS");
    assert_eq!(out.trace.modules[1].statements, vec![4]);
}

#[test]
fn scenario_esm_back_trace() {
    // An unrelated CJS module establishes `F` (spec §4.7) before the `var
    // a; var b; function f(){}` trio so they remain None for Pass 3 to absorb.
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var r=w((e,m)=>{m.exports=1;});\n\
               var v=(a,b)=>()=>(a=0,b());\n\
               var a;\nvar b;\nfunction f(){}\nvar m=v(()=>{a=b=f();});\n";
    let out = run(src);

    let esm_module = out.trace.modules.iter().find(|m| m.wrap_kind == "ESM").unwrap();
    assert_eq!(esm_module.statements, vec![3, 4, 5, 6]);

    let reclassified = out
        .trace
        .statements
        .iter()
        .filter(|s| [3u32, 4, 5].contains(&s.index) && s.wrap_kind == "ESM")
        .count();
    assert_eq!(reclassified, 3);
}

#[test]
fn scenario_import_supernode_clusters_with_factory_referencing_consumers() {
    // Consumers reference the factory names (`R1`/`R2`/`R3`) directly rather
    // than the import locals, so their fingerprints overlap the supernode's
    // and all five statements land in one module.
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var R1=w((e,m)=>{m.exports=1;});\n\
               var R2=w((e,m)=>{m.exports=2;});\n\
               var R3=w((e,m)=>{m.exports=3;});\n\
               var x1=R1();\nvar x2=R2();\nvar x3=R3();\n\
               var c1=R1()+R2();\nvar c2=R2()+R3();\n";
    let out = run(src);

    let none_module = out.trace.modules.iter().find(|m| m.wrap_kind == "None").unwrap();
    assert_eq!(none_module.statements, vec![4, 5, 6, 7, 8]);
}

#[test]
fn scenario_import_supernode_consumers_referencing_locals_split() {
    // Literal scenario input: consumers reference the import locals
    // (`x1`/`x2`/`x3`), not the factory names. A fingerprint only includes
    // module ids already assigned by passes 1-4 (see DESIGN.md), and `x1`-
    // `x3` are themselves still unassigned at fingerprinting time, so `c1`
    // and `c2` get an empty fingerprint against the supernode's `{R1,R2,R3}`
    // and do not cluster with it. They do cluster with *each other*, since
    // two empty fingerprints are defined as a perfect (1.0) Jaccard match.
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var R1=w((e,m)=>{m.exports=1;});\n\
               var R2=w((e,m)=>{m.exports=2;});\n\
               var R3=w((e,m)=>{m.exports=3;});\n\
               var x1=R1();\nvar x2=R2();\nvar x3=R3();\n\
               var c1=x1+x2;\nvar c2=x2+x3;\n";
    let out = run(src);

    let import_module = out.trace.modules.iter().find(|m| m.wrap_kind == "Import").unwrap();
    assert_eq!(import_module.statements, vec![4, 5, 6]);

    let none_module = out.trace.modules.iter().find(|m| m.wrap_kind == "None").unwrap();
    assert_eq!(none_module.statements, vec![7, 8]);
}

#[test]
fn scenario_jaccard_split_on_disjoint_fingerprints() {
    let src = "var r1=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var m1=r1((e,m)=>{m.exports=1;});\n\
               var m2=r1((e,m)=>{m.exports=2;});\n\
               var c1=m1;\nvar c2=m2;\n";
    let out = run(src);

    let none_modules: Vec<_> = out.trace.modules.iter().filter(|m| m.wrap_kind == "None").collect();
    assert_eq!(none_modules.len(), 2);
}

#[test]
fn scenario_preamble_promotion() {
    let src = "var _=Object.create;\n\
               var __=Object.defineProperty;\n\
               var ___=Object.getOwnPropertyNames;\n\
               var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var r=w((e,m)=>{m.exports=1;});\n";
    let out = run(src);

    assert_eq!(out.trace.modules[0].wrap_kind, "RUNTIME");
    assert_eq!(out.trace.modules[0].statements, vec![0, 1, 2, 3]);
    assert_eq!(out.trace.modules[1].wrap_kind, "CJS");
}

#[test]
fn scenario_idempotent_reannotation() {
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var r=w((e,m)=>{m.exports=1;});\n";
    let first = run(src);
    let second = run(&first.annotated_source);

    assert_eq!(first.classify.categories, second.classify.categories);
    assert_eq!(first.classify.wrapkind_distribution, second.classify.wrapkind_distribution);
    assert_eq!(first.trace.total_modules, second.trace.total_modules);
    assert_eq!(
        first.trace.modules.iter().map(|m| m.wrap_kind.clone()).collect::<Vec<_>>(),
        second.trace.modules.iter().map(|m| m.wrap_kind.clone()).collect::<Vec<_>>(),
    );
}

#[test]
fn invariant_i10_determinism_across_reruns() {
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var r=w((e,m)=>{m.exports=1;});\n\
               var x = 1;\nvar y = x;\n";
    let first = run(src);
    let second = run(src);

    assert_eq!(first.annotated_source, second.annotated_source);
    assert_eq!(
        serde_json::to_string(&first.classify).unwrap(),
        serde_json::to_string(&second.classify).unwrap(),
    );
    assert_eq!(
        serde_json::to_string(&first.trace).unwrap(),
        serde_json::to_string(&second.trace).unwrap(),
    );
}

#[test]
fn invariant_i5_graph_symmetry_at_module_level() {
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var R1=w((e,m)=>{m.exports=1;});\n\
               var R2=w((e,m)=>{m.exports=2;});\n\
               var c=R1()+R2();\n";
    let out = run(src);
    for module in &out.trace.modules {
        for &dep in &module.deps_out {
            let dep_module = out.trace.modules.iter().find(|m| m.id == dep).unwrap();
            assert!(dep_module.deps_in.contains(&module.id));
        }
        assert!(!module.deps_out.contains(&module.id), "module {} has a self-loop", module.id);
    }
}

#[test]
fn invariant_i8_sorted_outputs() {
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var R1=w((e,m)=>{m.exports=1;});\n\
               var R2=w((e,m)=>{m.exports=2;});\n\
               var c=R1()+R2();\n";
    let out = run(src);
    for module in &out.trace.modules {
        assert!(module.deps_out.windows(2).all(|w| w[0] < w[1]));
        assert!(module.deps_in.windows(2).all(|w| w[0] < w[1]));
    }
    for statement in &out.trace.statements {
        assert!(statement.refs_out.windows(2).all(|w| w[0] < w[1]));
        assert!(statement.refs_in.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn invariant_i9_wrapkind_determined_by_category_except_import() {
    let src = "var w=(a,b)=>()=>(b||a((b={exports:{}}).exports,b),b.exports);\n\
               var r=w((e,m)=>{m.exports=1;});\n\
               var x = 1;\n";
    let out = run(src);
    for statement in &out.classify.statements {
        let expected = if statement.category.contains("MODULE_FACTORY.__commonJS") {
            "CJS"
        } else if statement.category.contains("MODULE_FACTORY.__esm")
            || statement.category.contains("ADAPTED_IMPORT.__toESM")
            || statement.category.contains("REEXPORT.__copyProps")
        {
            "ESM"
        } else if statement.category.starts_with("RUNTIME_HELPER") {
            "RUNTIME"
        } else {
            "None"
        };
        assert_eq!(statement.wrap_kind, expected, "statement {} mismatched", statement.index);
    }
}
