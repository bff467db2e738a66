//! Property-based tests over the hashing and comparison engines.

use proptest::prelude::*;

use spamsum::{compare, eliminate_sequences, hash, FuzzyState};

/// Input data plus a random partition of it into chunks.
fn data_and_chunks() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    (proptest::collection::vec(any::<u8>(), 0..4096), any::<u64>()).prop_map(|(data, seed)| {
        let mut cuts = Vec::new();
        let mut position = 0usize;
        let mut state = seed | 1;
        while position < data.len() {
            // xorshift-derived chunk lengths between 1 and 257 bytes
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let step = (state as usize % 257) + 1;
            position = (position + step).min(data.len());
            cuts.push(position);
        }
        (data, cuts)
    })
}

proptest! {
    #[test]
    fn chunking_invariance((data, cuts) in data_and_chunks()) {
        let whole = hash(&data).expect("hash");

        let mut state = FuzzyState::new();
        let mut start = 0usize;
        for cut in cuts {
            state.update(&data[start..cut]);
            start = cut;
        }
        prop_assert_eq!(state.digest().expect("digest"), whole);
    }

    #[test]
    fn elimination_is_idempotent(s in "\\PC{0,200}") {
        let once = eliminate_sequences(&s);
        prop_assert_eq!(eliminate_sequences(&once), once);
    }

    #[test]
    fn elimination_never_leaves_runs_of_four(s in "[a-c]{0,64}") {
        let out = eliminate_sequences(&s);
        let bytes = out.as_bytes();
        let has_run = bytes
            .windows(4)
            .any(|w| w[0] == w[1] && w[1] == w[2] && w[2] == w[3]);
        prop_assert!(!has_run, "run survived in {:?}", out);
    }

    #[test]
    fn self_similarity(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let sig = hash(&data).expect("hash");
        prop_assert_eq!(compare(&sig, &sig), 100);
    }

    #[test]
    fn symmetry_and_range(
        a in proptest::collection::vec(any::<u8>(), 0..2048),
        b in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let sig_a = hash(&a).expect("hash");
        let sig_b = hash(&b).expect("hash");
        let forward = compare(&sig_a, &sig_b);
        let backward = compare(&sig_b, &sig_a);
        prop_assert_eq!(forward, backward);
        // Well-formed inputs never produce the malformed sentinel.
        prop_assert!((0..=100).contains(&forward));
    }

    #[test]
    fn appended_data_stays_similar(
        data in proptest::collection::vec(any::<u8>(), 512..2048),
        tail in proptest::collection::vec(any::<u8>(), 1..32),
    ) {
        // A small append may shift trigger positions, so the score is not
        // guaranteed to be high, but the comparison must stay well-formed
        // and symmetric.
        let mut extended = data.clone();
        extended.extend_from_slice(&tail);
        let sig_a = hash(&data).expect("hash");
        let sig_b = hash(&extended).expect("hash");
        let score = compare(&sig_a, &sig_b);
        prop_assert!((0..=100).contains(&score));
        prop_assert_eq!(score, compare(&sig_b, &sig_a));
    }
}
