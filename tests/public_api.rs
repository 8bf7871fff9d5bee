use foldev::{
    cross_validation_report, divide_corpus_conf, parse_hand_tagged_ids, Corpus, CorpusStats,
    Division, DivisionConfigBuilder, DivisionError, Document, EvalCounts, FoldOutcome,
    InitialPartition, ProportionMode,
};

fn org_per_corpus() -> Corpus {
    // 4 ORG and 6 PER occurrences in total: the ideal distribution is
    // ORG 40% / PER 60%.
    Corpus::from_documents(vec![
        Document::from_label_counts("d1.json", [("ORG", 2)]),
        Document::from_label_counts("d2.json", [("PER", 2)]),
        Document::from_label_counts("d3.json", [("ORG", 1), ("PER", 1)]),
        Document::from_label_counts("d4.json", [("PER", 2)]),
        Document::from_label_counts("d5.json", [("ORG", 1)]),
        Document::from_label_counts("d6.json", [("PER", 1)]),
    ])
    .unwrap()
}

#[test]
fn division_scenario_with_hand_computed_scores() {
    let corpus = org_per_corpus();
    let stats = CorpusStats::collect(&corpus);
    let ideal = stats.ideal_distribution();
    assert!((ideal.percentage("ORG") - 40.0).abs() < 1e-9);
    assert!((ideal.percentage("PER") - 60.0).abs() < 1e-9);

    let ids: Vec<String> = corpus.ids().map(String::from).collect();
    let chunks = foldev::even_chunks(&ids, 2).unwrap();
    assert_eq!(chunks[0].len(), 3);
    assert_eq!(chunks[1].len(), 3);

    // First chunk holds ORG 3 / PER 3 (50% each): deviation 10 + 10.
    let score = stats
        .score(&chunks[0], &ideal, ProportionMode::Exact)
        .unwrap();
    assert!((score - 20.0).abs() < 1e-9);
    // Second chunk holds ORG 1 / PER 3 (25% / 75%): deviation 15 + 15.
    let score = stats
        .score(&chunks[1], &ideal, ProportionMode::Exact)
        .unwrap();
    assert!((score - 30.0).abs() < 1e-9);
}

#[test]
fn contiguous_division_partitions_the_corpus() {
    let corpus = org_per_corpus();
    let config = DivisionConfigBuilder::default().n_folds(3).build();
    let division = divide_corpus_conf(&corpus, config).unwrap();
    assert_eq!(division.n_folds(), 3);
    assert_eq!(division.len(), corpus.len());
    assert!(division.is_partition_of(&corpus));
}

#[test]
fn random_division_is_disjoint_and_reproducible() {
    let corpus = org_per_corpus();
    let partition = InitialPartition::Random { seed: Some(42) };
    let config = DivisionConfigBuilder::default()
        .n_folds(3)
        .partition(partition)
        .build();
    let first = divide_corpus_conf(&corpus, config.clone()).unwrap();
    assert!(first.is_partition_of(&corpus));
    let second = divide_corpus_conf(&corpus, config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_corpus_divides_into_empty_folds() {
    let corpus = Corpus::new();
    let config = DivisionConfigBuilder::default().n_folds(5).build();
    let division = divide_corpus_conf(&corpus, config).unwrap();
    assert_eq!(division.n_folds(), 5);
    assert!(division.is_empty());
    assert!(division.is_partition_of(&corpus));
}

#[test]
fn zero_folds_is_an_error() {
    let corpus = org_per_corpus();
    let config = DivisionConfigBuilder::default().n_folds(0).build();
    let err = divide_corpus_conf(&corpus, config).unwrap_err();
    assert_eq!(err, DivisionError::NoFolds);
}

#[test]
fn hand_tagged_documents_leave_the_designated_fold() {
    // All documents carry the same label counts, so every swap is a tie and
    // is accepted by the tolerance rule.
    let mut corpus = Corpus::from_documents(vec![
        Document::from_label_counts("Tartu_Kodavere_id101_1882a.json", [("PER", 1)]),
        Document::from_label_counts("Tartu_Kodavere_id102_1883a.json", [("PER", 1)]),
        Document::from_label_counts("Tartu_Kodavere_id103_1884a.json", [("PER", 1)]),
        Document::from_label_counts("Tartu_Kodavere_id104_1885a.json", [("PER", 1)]),
    ])
    .unwrap();
    let ids = parse_hand_tagged_ids("101\n---\n103\n");
    assert_eq!(corpus.mark_hand_tagged(&ids), 2);

    // Both folds hold one hand-tagged document, so fold 1 is designated by
    // the lower-index tie break. id101 must be swapped out of it, against
    // id104, the only candidate of fold 2 that is not itself hand-tagged.
    let config = DivisionConfigBuilder::default().n_folds(2).build();
    let division = divide_corpus_conf(&corpus, config).unwrap();
    assert!(division.is_partition_of(&corpus));
    assert_eq!(division.fold_of("Tartu_Kodavere_id101_1882a.json"), Some(2));
    assert_eq!(division.fold_of("Tartu_Kodavere_id103_1884a.json"), Some(2));
    assert_eq!(division.fold_of("Tartu_Kodavere_id104_1885a.json"), Some(1));
}

#[test]
fn designated_fold_can_be_overridden() {
    let corpus = org_per_corpus();
    let config = DivisionConfigBuilder::default()
        .n_folds(2)
        .designated_fold(7)
        .build();
    // No hand-tagged documents: the out-of-range fold is never consulted.
    assert!(divide_corpus_conf(&corpus, config).is_ok());

    let mut corpus = Corpus::from_documents(vec![
        Document::from_label_counts("a_id1_x.json", [("PER", 1)]),
        Document::from_label_counts("b_id2_x.json", [("PER", 1)]),
    ])
    .unwrap();
    corpus.mark_hand_tagged(&["1"]);
    let config = DivisionConfigBuilder::default()
        .n_folds(2)
        .designated_fold(7)
        .build();
    let err = divide_corpus_conf(&corpus, config).unwrap_err();
    assert_eq!(
        err,
        DivisionError::DesignatedFoldOutOfRange {
            fold: 7,
            n_folds: 2
        }
    );
}

#[test]
fn division_round_trips_through_the_persisted_format() {
    let corpus = org_per_corpus();
    let config = DivisionConfigBuilder::default().n_folds(3).build();
    let division = divide_corpus_conf(&corpus, config).unwrap();
    let persisted = division.to_string();
    let parsed: Division = persisted.parse().unwrap();
    assert_eq!(parsed, division);
}

#[test]
fn fold_outcomes_aggregate_into_a_report() {
    let mut fold1 = FoldOutcome::new(1, EvalCounts::new(1, 2, 2));
    fold1.insert_label("PER", EvalCounts::new(1, 2, 2));
    let mut fold2 = FoldOutcome::new(2, EvalCounts::new(1, 2, 2));
    fold2.insert_label("PER", EvalCounts::new(1, 2, 2));
    let reporter = cross_validation_report(&[fold1, fold2]);
    let expected = "Subset, Label, Precision, Recall, F1-score, Support\n\
                    1, Overall, 0.5, 0.5, 0.5, 2\n\
                    2, Overall, 0.5, 0.5, 0.5, 2\n\
                    Total, Overall, 0.5, 0.5, 0.5, 4\n";
    assert_eq!(reporter.to_string(), expected);
}
