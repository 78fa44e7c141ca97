use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Reference model: key -> (accumulated weight, first value).
type Model = BTreeMap<Vec<u8>, (f64, u64)>;

fn validate<P: PrefixIndex<u8, u64>>(t: &P, m: &Model) {
    t.check_invariants().expect("tree invariants must hold");
    verify::check_leaf_weights(t.root(), m.iter().map(|(k, (w, _))| (k.clone(), *w)))
        .expect("leaf weights must match the model");
    assert_eq!(t.len(), m.len());
    assert_eq!(t.is_empty(), m.is_empty());
    let total: f64 = m.values().map(|(w, _)| w).sum();
    assert_eq!(t.weight(), total);
}

/// Expected autocomplete output: heaviest first, ties by ascending key.
fn expected_completions(m: &Model, prefix: &[u8], limit: Option<usize>) -> Vec<(Vec<u8>, f64, u64)> {
    let mut out: Vec<(Vec<u8>, f64, u64)> = m
        .iter()
        .filter(|(k, _)| k.starts_with(prefix))
        .map(|(k, (w, v))| (k.clone(), *w, *v))
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(n) = limit.filter(|&n| n > 0) {
        out.truncate(n);
    }
    out
}

fn completions<P: PrefixIndex<u8, u64>>(t: &P, prefix: &[u8], limit: Option<usize>) -> Vec<(Vec<u8>, f64, u64)> {
    t.autocomplete(prefix, limit)
        .into_iter()
        .map(|s| (s.key.to_vec(), s.weight, *s.value))
        .collect()
}

/// Pre-order dump of labels and leaf flags, weights left out.
fn shape<P: PrefixIndex<u8, u64>>(t: &P) -> Vec<(Vec<u8>, bool)> {
    let mut out = Vec::new();
    let mut stack: Vec<&Node<u8, u64>> = t.root().into_iter().collect();
    while let Some(node) = stack.pop() {
        out.push((node.label().to_vec(), node.is_leaf()));
        stack.extend(node.children().iter().rev());
    }
    out
}

#[derive(Clone, Debug)]
enum Op {
    Insert(Vec<u8>, u8, u64),
    Remove(Vec<u8>),
    Autocomplete(Vec<u8>, Option<usize>),
    RemovePrefix(Vec<u8>),
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // A small alphabet keeps shared prefixes and exact repeats frequent.
    prop::collection::vec(b'a'..=b'd', 0..=6)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        50 => (key.clone(), 0u8..=20, any::<u64>()).prop_map(|(k, w, v)| Op::Insert(k, w, v)),
        25 => key.clone().prop_map(Op::Remove),
        20 => (key.clone(), prop::option::of(0usize..=5)).prop_map(|(k, n)| Op::Autocomplete(k, n)),
        5 => key.clone().prop_map(Op::RemovePrefix),
    ];
    prop::collection::vec(op, 0..=300)
}

fn run_ops<P: PrefixIndex<u8, u64>>(t: &mut P, ops: Vec<Op>) -> std::result::Result<(), TestCaseError> {
    let mut m = Model::new();

    for op in ops {
        match op {
            Op::Insert(key, weight, value) => {
                t.insert(&key, f64::from(weight), value).expect("weight is valid");
                m.entry(key).or_insert((0.0, value)).0 += f64::from(weight);
            }
            Op::Remove(key) => {
                let got = t.remove(&key);
                let want = m.remove(&key).map(|(_, v)| v);
                prop_assert_eq!(got, want);
            }
            Op::Autocomplete(prefix, limit) => {
                let got = completions(t, &prefix, limit);
                prop_assert!(got.windows(2).all(|w| w[0].1 >= w[1].1));
                prop_assert_eq!(got, expected_completions(&m, &prefix, limit));
            }
            Op::RemovePrefix(prefix) => {
                let before = m.len();
                m.retain(|k, _| !k.starts_with(&prefix));
                prop_assert_eq!(t.remove_prefix(&prefix), before - m.len());
            }
        }
        validate(t, &m);
    }

    let keys: Vec<Vec<u8>> = m.keys().cloned().collect();
    for key in keys {
        prop_assert!(t.remove(&key).is_some());
    }
    prop_assert!(t.is_empty());
    prop_assert_eq!(t.weight(), 0.0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_simple_matches_model(ops in ops_strategy()) {
        let mut t: SimplePrefixTree<u8, u64> = SimplePrefixTree::new();
        run_ops(&mut t, ops)?;
    }

    #[test]
    fn prop_compressed_matches_model(ops in ops_strategy()) {
        let mut t: CompressedPrefixTree<u8, u64> = CompressedPrefixTree::new();
        run_ops(&mut t, ops)?;
    }

    #[test]
    fn prop_variants_agree(records in prop::collection::vec((key_strategy(), 0u8..=20), 0..=100), prefix in key_strategy()) {
        let mut s: SimplePrefixTree<u8, u64> = SimplePrefixTree::new();
        let mut c: CompressedPrefixTree<u8, u64> = CompressedPrefixTree::new();
        for (i, (key, weight)) in records.iter().enumerate() {
            s.insert(key, f64::from(*weight), i as u64).unwrap();
            c.insert(key, f64::from(*weight), i as u64).unwrap();
        }
        prop_assert_eq!(completions(&s, &prefix, None), completions(&c, &prefix, None));
        prop_assert_eq!(s.weight(), c.weight());
    }

    #[test]
    fn prop_reinsert_keeps_shape(records in prop::collection::vec((key_strategy(), 1u8..=20), 1..=60)) {
        let mut s: SimplePrefixTree<u8, u64> = SimplePrefixTree::new();
        let mut c: CompressedPrefixTree<u8, u64> = CompressedPrefixTree::new();
        for (key, weight) in &records {
            s.insert(key, f64::from(*weight), 0).unwrap();
            c.insert(key, f64::from(*weight), 0).unwrap();
        }
        let (shape_s, shape_c) = (shape(&s), shape(&c));
        let (weight_s, weight_c) = (s.weight(), c.weight());

        for (key, weight) in &records {
            s.insert(key, f64::from(*weight), 0).unwrap();
            c.insert(key, f64::from(*weight), 0).unwrap();
        }
        prop_assert_eq!(shape(&s), shape_s);
        prop_assert_eq!(shape(&c), shape_c);
        prop_assert_eq!(s.weight(), weight_s * 2.0);
        prop_assert_eq!(c.weight(), weight_c * 2.0);
    }
}

/// Calls `f` with every ordering of `items`, generated by swaps.
fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    let mut perm = items.to_vec();
    let mut counters = vec![0usize; perm.len()];
    f(perm.clone());

    let mut i = 1;
    while i < perm.len() {
        if counters[i] < i {
            let j = if i % 2 == 0 { 0 } else { counters[i] };
            perm.swap(j, i);
            f(perm.clone());
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
}

#[test]
fn permutations_are_distinct_and_complete() {
    let mut seen = std::collections::BTreeSet::new();
    for_each_permutation(&[1, 2, 3, 4], |perm| {
        assert!(seen.insert(perm));
    });
    assert_eq!(seen.len(), 24);
}

fn small_set() -> Vec<(Vec<u8>, u64)> {
    vec![
        (b"a".to_vec(), 1),
        (b"b".to_vec(), 2),
        (b"ab".to_vec(), 3),
        (b"abc".to_vec(), 4),
        (b"abd".to_vec(), 5),
        (b"ba".to_vec(), 6),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let mut simple_shape = None;
    let mut compressed_shape = None;

    for_each_permutation(&small_set(), |perm| {
        let mut s: SimplePrefixTree<u8, u64> = SimplePrefixTree::new();
        let mut c: CompressedPrefixTree<u8, u64> = CompressedPrefixTree::new();
        let mut m = Model::new();
        for (k, w) in perm {
            s.insert(&k, w as f64, w).unwrap();
            c.insert(&k, w as f64, w).unwrap();
            m.insert(k, (w as f64, w));
            validate(&s, &m);
            validate(&c, &m);
        }

        // Final structure depends only on the set of keys and weights.
        let (shape_s, shape_c) = (s.to_string(), c.to_string());
        assert_eq!(simple_shape.get_or_insert_with(|| shape_s.clone()), &shape_s);
        assert_eq!(compressed_shape.get_or_insert_with(|| shape_c.clone()), &shape_c);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let mut base_s: SimplePrefixTree<u8, u64> = SimplePrefixTree::new();
    let mut base_c: CompressedPrefixTree<u8, u64> = CompressedPrefixTree::new();
    let mut base_m = Model::new();
    for (k, w) in small_set() {
        base_s.insert(&k, w as f64, w).unwrap();
        base_c.insert(&k, w as f64, w).unwrap();
        base_m.insert(k, (w as f64, w));
    }

    for_each_permutation(&small_set(), |perm| {
        let mut s = base_s.clone();
        let mut c = base_c.clone();
        let mut m = base_m.clone();

        for (k, w) in perm {
            assert_eq!(s.remove(&k), Some(w));
            assert_eq!(c.remove(&k), Some(w));
            m.remove(&k);
            validate(&s, &m);
            validate(&c, &m);
        }
        assert!(s.root().is_none());
        assert!(c.root().is_none());
    });
}

#[test]
fn harness_records_accumulate() {
    let records: &[(&str, f64)] = &[
        ("trm", 9.0), ("fmi", 3.0), ("ijf", 6.0), ("nxu", 3.0), ("ddg", 2.0), ("mhk", 3.0),
        ("fac", 2.0), ("txt", 1.0), ("ruj", 1.0), ("ktp", 1.0), ("ljo", 4.0), ("cea", 8.0),
        ("pqx", 1.0), ("rxa", 3.0), ("qbe", 7.0), ("hiu", 8.0), ("nrx", 7.0), ("kcs", 4.0),
        ("gyk", 8.0), ("qig", 8.0), ("tab", 4.0), ("kaq", 8.0), ("bxm", 6.0), ("jqe", 7.0),
        ("ytf", 7.0), ("wrs", 6.0), ("xyd", 5.0), ("fax", 4.0), ("sdz", 4.0), ("mqe", 2.0),
        ("fmi", 3.0), ("ijf", 4.0), ("nxu", 9.0), ("ddg", 5.0), ("qbe", 2.0), ("hiu", 1.0),
        ("nrx", 4.0), ("kcs", 8.0),
    ];

    let mut s: SimplePrefixTree<char, Vec<char>> = SimplePrefixTree::new();
    let mut c: CompressedPrefixTree<char, Vec<char>> = CompressedPrefixTree::new();
    for (k, w) in records {
        let key: Vec<char> = k.chars().collect();
        s.insert(&key, *w, key.clone()).unwrap();
        c.insert(&key, *w, key.clone()).unwrap();
    }

    let recorded = records.iter().map(|(k, w)| (k.chars().collect::<Vec<_>>(), *w));
    for result in [
        s.check_invariants(),
        c.check_invariants(),
        verify::check_leaf_weights(s.root(), recorded.clone()),
        verify::check_leaf_weights(c.root(), recorded),
    ] {
        assert_eq!(result, Ok(()));
    }
    assert_eq!(s.len(), 30);
    assert_eq!(s.get(&['n', 'x', 'u']).map(|(_, w)| w), Some(12.0));
    assert_eq!(c.get(&['k', 'c', 's']).map(|(_, w)| w), Some(12.0));

    let top: Vec<String> = c
        .autocomplete(&[], Some(3))
        .iter()
        .map(|s| s.key.iter().collect())
        .collect();
    assert_eq!(top, vec!["kcs", "nxu", "nrx"]);
}

#[test]
fn randomized_insert_remove_autocomplete() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(2);
    let mut s: SimplePrefixTree<u8, u64> = SimplePrefixTree::new();
    let mut c: CompressedPrefixTree<u8, u64> = CompressedPrefixTree::new();
    let mut m = Model::new();

    for i in 0..20_000u64 {
        let op = rng.gen_range(0..100);
        let len = rng.gen_range(0..10);
        let key: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'f')).collect();

        match op {
            0..=54 => {
                let w = f64::from(rng.gen_range(0u8..50));
                s.insert(&key, w, i).unwrap();
                c.insert(&key, w, i).unwrap();
                m.entry(key).or_insert((0.0, i)).0 += w;
            }
            55..=84 => {
                let want = m.remove(&key).map(|(_, v)| v);
                assert_eq!(s.remove(&key), want);
                assert_eq!(c.remove(&key), want);
            }
            _ => {
                let prefix = &key[..key.len().min(2)];
                let limit = Some(rng.gen_range(1..8));
                let want = expected_completions(&m, prefix, limit);
                assert_eq!(completions(&s, prefix, limit), want);
                assert_eq!(completions(&c, prefix, limit), want);
            }
        }
    }

    validate(&s, &m);
    validate(&c, &m);
}
