use proptest::prelude::*;
use seqscope::config::ConfigError;
use seqscope::event::Event;
use seqscope::parallel::ParallelRunner;
use seqscope::results::prune_strong_matches;
use seqscope::{MatchConfig, ResultSet, SearchError, SearchIndex, Snippet, SubSequence};
use std::sync::Arc;

fn ev(i: usize, name: &str) -> Event {
    Event::new(i as i64 * 1000, name, "View", "app").with_user("u1")
}

fn snippet(id: &str, names: &[String]) -> Arc<Snippet> {
    Arc::new(Snippet::new(id, names.iter().enumerate().map(|(i, n)| ev(i, n)).collect()))
}

fn names(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{prefix}{i}")).collect()
}

fn letters(s: &str) -> Vec<String> {
    s.chars().map(|c| c.to_string()).collect()
}

fn spans(set: &ResultSet) -> Vec<(String, usize, usize, f64)> {
    set.iter().map(|s| (s.snippet().id().to_string(), s.start(), s.end(), s.distance())).collect()
}

/// 100 distinct filler events with the motif m0..m4 planted at 10 and 60.
fn motif_log() -> Arc<Snippet> {
    let mut log = names("f", 0..100);
    for (k, m) in names("m", 0..5).into_iter().enumerate() {
        log[10 + k] = m.clone();
        log[60 + k] = m;
    }
    snippet("motif-log", &log)
}

fn cfg(n: usize, density: f64) -> MatchConfig {
    MatchConfig { ngram_length: n, ngram_density: density, ..Default::default() }
}

#[test]
fn planted_motif_is_found_twice() {
    let mut index = SearchIndex::new(cfg(3, 0.33)).unwrap();
    index.index([motif_log()]).unwrap();
    let query = snippet("q", &names("m", 0..5));

    let urs = index.find_matches(&query).unwrap();
    let strong = spans(&urs.strong_matches);
    assert_eq!(strong.len(), 2);
    let mut starts: Vec<(usize, usize)> = strong.iter().map(|s| (s.1, s.2)).collect();
    starts.sort();
    assert_eq!(starts, vec![(10, 15), (60, 65)]);
    assert!(strong.iter().all(|s| s.3 == 0.0));
    assert!(urs.weak_matches.is_empty());

    let elongated: Vec<(usize, usize)> = urs.elongated_matches.iter().map(|s| (s.start(), s.end())).collect();
    assert!(elongated.contains(&(10, 20)));
    assert!(elongated.contains(&(60, 70)));
}

#[test]
fn query_is_retrieved_from_its_own_log() {
    let log = snippet("session", &names("e", 0..40));
    let other = snippet("other", &names("x", 0..40));
    let mut index = SearchIndex::new(cfg(3, 0.33)).unwrap();
    index.index([log.clone(), other]).unwrap();

    let query = SubSequence::new(15, 22, log, 0.0).sub_snippet();
    assert_eq!(query.len(), 7);
    let urs = index.find_matches(&query).unwrap();
    assert_eq!(spans(&urs.strong_matches), vec![("session".to_string(), 15, 22, 0.0)]);
}

#[test]
fn query_longer_than_every_log_matches_nothing() {
    let mut index = SearchIndex::new(cfg(2, 0.1)).unwrap();
    index.index([snippet("a", &letters("abcde")), snippet("b", &letters("cdeab"))]).unwrap();
    let urs = index.find_matches(&snippet("q", &letters("abcdeabc"))).unwrap();
    assert!(urs.is_empty());
    assert_eq!(urs.total(), 0);
}

#[test]
fn empty_corpus_returns_empty_results() {
    let index = SearchIndex::new(MatchConfig::default()).unwrap();
    assert!(index.find_matches(&snippet("q", &letters("abc"))).unwrap().is_empty());
}

#[test]
fn poor_alignment_is_demoted_to_weak() {
    let mut log = names("f", 0..10);
    log.extend(letters("ABXYZW"));
    log.extend(names("f", 10..20));
    let mut index = SearchIndex::new(cfg(2, 0.2)).unwrap();
    index.index([snippet("log", &log)]).unwrap();

    let urs = index.find_matches(&snippet("q", &letters("ABCDEF"))).unwrap();
    assert!(urs.strong_matches.is_empty());
    let weak = spans(&urs.weak_matches);
    assert_eq!(weak.len(), 1);
    assert_eq!((weak[0].1, weak[0].2), (10, 16));
    assert!((weak[0].3 - 4.0 / 6.0).abs() < 1e-9);
}

#[test]
fn diverging_tail_is_reported_as_alternative_ending() {
    let mut log = names("f", 0..10);
    log.extend(letters("ABCDEFGHXY"));
    log.extend(names("f", 10..20));
    let config = MatchConfig {
        ngram_length: 3,
        ngram_density: 0.33,
        admittance_threshold: 0.4,
        fraction_to_match: 0.8,
        ..Default::default()
    };
    let mut index = SearchIndex::new(config).unwrap();
    index.index([snippet("log", &log)]).unwrap();

    let urs = index.find_matches(&snippet("q", &letters("ABCDEFGHIJ"))).unwrap();
    assert_eq!(spans(&urs.alt_ending_matches), vec![("log".to_string(), 10, 20, 0.25)]);
    let strong = spans(&urs.strong_matches);
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[0].1, 10);
    assert!((strong[0].3 - 0.2).abs() < 1e-9);
}

#[test]
fn search_can_be_restricted_to_some_logs() {
    let a = motif_log();
    let b = snippet("b", &names("m", 0..5));
    let mut index = SearchIndex::new(cfg(3, 0.33)).unwrap();
    index.index([a.clone(), b.clone()]).unwrap();
    let query = snippet("q", &names("m", 0..5));

    let all = index.find_matches(&query).unwrap();
    assert_eq!(all.strong_matches.len(), 3);

    let only_b = index.find_matches_in(&query, &[b]).unwrap();
    assert_eq!(spans(&only_b.strong_matches), vec![("b".to_string(), 0, 5, 0.0)]);

    let stranger = snippet("never-indexed", &names("m", 0..5));
    assert!(index.find_matches_in(&query, &[stranger]).unwrap().is_empty());
}

#[test]
fn logs_indexed_at_other_lengths_are_skipped() {
    let a = snippet("a", &letters("zzabcdezz"));
    let b = snippet("b", &letters("yyabcdeyy"));
    let mut index = SearchIndex::new(cfg(3, 0.3)).unwrap();
    index.index_logs([a], 3).unwrap();
    index.index_logs([b], 2).unwrap();
    assert_eq!(index.ngram_lengths(), &[3, 2]);

    let urs = index.find_matches(&snippet("q", &letters("abcde"))).unwrap();
    let mut ids: Vec<String> = urs.strong_matches.iter().map(|s| s.snippet().id().to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    assert!(urs.strong_matches.iter().all(|s| s.start() == 2 && s.distance() == 0.0));
}

#[test]
fn corpus_bookkeeping() {
    let mut index = SearchIndex::new(MatchConfig::default()).unwrap();
    let a = snippet("a", &letters("abcdef"));
    assert_eq!(index.index([a.clone(), snippet("b", &letters("fedcba"))]).unwrap(), 2);
    assert_eq!(index.len(), 2);
    assert!(Arc::ptr_eq(&index.log_by_id("a").unwrap(), &a));
    assert!(index.log_by_id("c").is_none());

    // same id, different content: replaced in place
    index.index([snippet("a", &letters("xyz"))]).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.log_by_id("a").unwrap().len(), 3);

    let symbols = index.registry().len();
    index.clear_index();
    assert!(index.is_empty());
    assert!(index.all_logs().is_empty());
    assert!(index.ngram_lengths().is_empty());
    assert_eq!(index.registry().len(), symbols);
}

#[test]
fn invalid_configuration_is_rejected() {
    let bad = MatchConfig { ngram_density: 0.0, ..Default::default() };
    assert!(matches!(SearchIndex::new(bad), Err(SearchError::Config(ConfigError::InvalidDensity(_)))));

    let mut index = SearchIndex::new(MatchConfig::default()).unwrap();
    let err = index.index_logs([snippet("a", &letters("abc"))], 0).unwrap_err();
    assert!(matches!(err, SearchError::Config(ConfigError::InvalidNGramLength(0))));
    assert!(index.set_config(MatchConfig { fraction_to_match: 1.5, ..Default::default() }).is_err());
    assert_eq!(index.config(), &MatchConfig::default());
}

#[test]
fn parallel_matching_agrees_with_sequential() {
    let logs: Vec<Arc<Snippet>> = (0..12)
        .map(|k| {
            let mut l = names(&format!("f{k}_"), 0..60);
            for (j, m) in names("m", 0..6).into_iter().enumerate() {
                l[(k * 3 + j) % 54] = m;
            }
            snippet(&format!("log{k}"), &l)
        })
        .collect();
    let query = snippet("q", &names("m", 0..6));

    let mut seq = SearchIndex::new(cfg(2, 0.3)).unwrap();
    seq.index(logs.clone()).unwrap();
    let par_cfg = MatchConfig { parallel_matching: true, ..cfg(2, 0.3) };
    let mut par = SearchIndex::with_runner(par_cfg, ParallelRunner::with_threads(4)).unwrap();
    par.index(logs).unwrap();

    let a = seq.find_matches(&query).unwrap();
    let b = par.find_matches(&query).unwrap();
    assert_eq!(a.strong_matches.len(), 12);
    assert_eq!(spans(&a.strong_matches), spans(&b.strong_matches));
    assert_eq!(spans(&a.weak_matches), spans(&b.weak_matches));
    assert_eq!(spans(&a.elongated_matches), spans(&b.elongated_matches));
    assert_eq!(spans(&a.alt_ending_matches), spans(&b.alt_ending_matches));
}

#[test]
fn overlapping_matches_collapse_once_per_log() {
    let a = snippet("a", &names("f", 0..50));
    let b = snippet("b", &names("f", 0..50));
    let query = snippet("q", &letters("abcde"));
    let mut set = ResultSet::from_results(
        vec![
            SubSequence::new(17, 22, a.clone(), 0.3),
            SubSequence::new(10, 15, a.clone(), 0.4),
            SubSequence::new(40, 45, b.clone(), 0.0),
            SubSequence::new(13, 18, a.clone(), 0.2),
            SubSequence::new(32, 36, a.clone(), 0.1),
            SubSequence::new(12, 16, b.clone(), 0.5),
            SubSequence::new(30, 35, a.clone(), 0.1),
            SubSequence::new(10, 15, b.clone(), 0.5),
        ],
        query,
    );

    assert_eq!(prune_strong_matches(&mut set), 4);
    let once = spans(&set);
    assert_eq!(
        once,
        vec![
            ("b".to_string(), 40, 45, 0.0),
            ("a".to_string(), 30, 35, 0.1),
            ("a".to_string(), 13, 18, 0.2),
            ("b".to_string(), 10, 15, 0.5),
        ]
    );

    assert_eq!(prune_strong_matches(&mut set), 0);
    assert_eq!(spans(&set), once);
}

#[test]
fn duplicate_hits_from_several_lengths_are_pruned() {
    let log = motif_log();
    let mut index = SearchIndex::new(cfg(3, 0.33)).unwrap();
    index.index_logs([log.clone()], 3).unwrap();
    index.index_logs([log], 2).unwrap();
    assert_eq!(index.ngram_lengths(), &[3, 2]);

    let mut urs = index.find_matches(&snippet("q", &names("m", 0..5))).unwrap();
    let mut strong: Vec<(usize, usize)> = urs.strong_matches.iter().map(|s| (s.start(), s.end())).collect();
    strong.sort();
    assert_eq!(strong, vec![(10, 15), (60, 65)]);
    assert_eq!(prune_strong_matches(&mut urs.strong_matches), 0);
}

proptest! {
    #[test]
    fn pruned_matches_never_overlap(raw in proptest::collection::vec((0usize..2, 0usize..40, 1usize..8, 0u8..10), 0..30)) {
        let logs = [snippet("a", &names("f", 0..50)), snippet("b", &names("f", 0..50))];
        let subs: Vec<SubSequence> = raw
            .iter()
            .map(|&(log, start, len, d)| SubSequence::new(start, start + len, logs[log].clone(), f64::from(d) / 10.0))
            .collect();
        let total = subs.len();
        let mut set = ResultSet::from_results(subs, snippet("q", &letters("ab")));

        let removed = prune_strong_matches(&mut set);
        prop_assert_eq!(removed + set.len(), total);
        for (i, x) in set.iter().enumerate() {
            for y in set.iter().skip(i + 1) {
                prop_assert!(!x.overlaps(y) && !y.overlaps(x));
            }
        }
        let once = spans(&set);
        prop_assert_eq!(prune_strong_matches(&mut set), 0);
        prop_assert_eq!(spans(&set), once);
    }
}

#[test]
fn query_shorter_than_ngram_length_matches_nothing() {
    let mut index = SearchIndex::new(cfg(4, 0.33)).unwrap();
    index.index([motif_log()]).unwrap();
    let urs = index.find_matches(&snippet("q", &names("m", 0..3))).unwrap();
    assert!(urs.is_empty());
}

#[test]
fn huge_elongation_factor_is_rejected_up_front() {
    let bad = MatchConfig { elongation_factor: usize::MAX / 2, ..cfg(3, 0.33) };
    assert!(matches!(
        SearchIndex::new(bad.clone()),
        Err(SearchError::Config(ConfigError::InvalidElongationFactor(_)))
    ));

    let mut index = SearchIndex::new(cfg(3, 0.33)).unwrap();
    index.index([motif_log()]).unwrap();
    assert!(index.set_config(bad).is_err());
    let urs = index.find_matches(&snippet("q", &names("m", 0..5))).unwrap();
    assert_eq!(urs.strong_matches.len(), 2);
}

#[test]
fn results_serialize_log_ids_instead_of_events() {
    let mut index = SearchIndex::new(cfg(3, 0.33)).unwrap();
    index.index([motif_log()]).unwrap();
    let urs = index.find_matches(&snippet("q", &names("m", 0..5))).unwrap();
    let json = serde_json::to_value(&urs).unwrap();
    assert_eq!(json["query"], "q");
    assert_eq!(json["strong_matches"]["results"][0]["snippet"], "motif-log");
}
