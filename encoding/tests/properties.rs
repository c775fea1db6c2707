//! Property tests for the encoding layer: round-trips, sort fidelity and
//! boundary-aware prefix semantics across bases and codings.

use proptest::prelude::*;
use treepath_encoding::{codec, Alphabet, Collation, NodeId, NodePath, PathCodec, SegmentCoding};

const BASES: [usize; 5] = [16, 36, 62, 95, 128];

/// Widths that give every base full coverage of the id range.
fn fixed_width_for(base: usize) -> usize {
    match base {
        16 => 16,
        36 => 13,
        62 => 11,
        _ => 10,
    }
}

fn codecs_for(base: usize) -> Vec<PathCodec> {
    let alphabet = Alphabet::with_base(base, Collation::Binary).unwrap();
    vec![
        PathCodec::new(alphabet.clone(), SegmentCoding::FixedWidth { width: fixed_width_for(base) }).unwrap(),
        PathCodec::new(alphabet, SegmentCoding::LengthPrefixed).unwrap(),
    ]
}

proptest! {
    #[test]
    fn digits_round_trip(id in any::<u64>(), base_index in 0usize..BASES.len()) {
        let alphabet = Alphabet::with_base(BASES[base_index], Collation::Binary).unwrap();
        let digits = codec::encode(&alphabet, NodeId::new(id));
        prop_assert_eq!(codec::decode(&alphabet, &digits).unwrap(), NodeId::new(id));
    }

    #[test]
    fn segments_round_trip(id in 0u64..1 << 60, base_index in 0usize..BASES.len()) {
        for codec in codecs_for(BASES[base_index]) {
            let segment = codec.segment(NodeId::new(id)).unwrap();
            let (decoded, rest) = codec.decode_one(segment.as_bytes()).unwrap();
            prop_assert_eq!(decoded, NodeId::new(id));
            prop_assert!(rest.is_empty());
        }
    }

    #[test]
    fn segment_order_matches_id_order(a in 0u64..1 << 60, b in 0u64..1 << 60, base_index in 0usize..BASES.len()) {
        for codec in codecs_for(BASES[base_index]) {
            let sa = codec.segment(NodeId::new(a)).unwrap();
            let sb = codec.segment(NodeId::new(b)).unwrap();
            prop_assert_eq!(a.cmp(&b), sa.as_bytes().cmp(sb.as_bytes()));
        }
    }

    #[test]
    fn short_payloads_sort_below_long_ones(a in 0u64..36, b in 36u64..36 * 36) {
        // any one-payload-symbol segment vs any two-payload-symbol segment
        let codec = PathCodec::new(
            Alphabet::with_base(36, Collation::Binary).unwrap(),
            SegmentCoding::LengthPrefixed,
        ).unwrap();
        let short = codec.segment(NodeId::new(a)).unwrap();
        let long = codec.segment(NodeId::new(b)).unwrap();
        prop_assert!(short < long);
    }

    #[test]
    fn paths_round_trip(ids in prop::collection::vec(0u64..36u64.pow(4), 1..6)) {
        let codec = PathCodec::new(
            Alphabet::with_base(36, Collation::Binary).unwrap(),
            SegmentCoding::FixedWidth { width: 4 },
        ).unwrap();
        let path = ids.iter().try_fold(NodePath::empty(), |parent, &id| codec.build(&parent, NodeId::new(id))).unwrap();
        let decoded: Vec<u64> = codec.decode(&path).unwrap().into_iter().map(NodeId::value).collect();
        prop_assert_eq!(&decoded, &ids);
        prop_assert_eq!(codec.depth(&path).unwrap(), ids.len());
    }

    #[test]
    fn ancestry_follows_truncation(ids in prop::collection::vec(0u64..1 << 30, 2..6)) {
        for codec in codecs_for(36) {
            let path = ids.iter().try_fold(NodePath::empty(), |parent, &id| codec.build(&parent, NodeId::new(id))).unwrap();
            for depth in 0..ids.len() {
                let ancestor = codec.truncate(&path, depth).unwrap();
                prop_assert!(codec.is_descendant_of(&path, &ancestor).unwrap());
            }
            // a path is not its own descendant
            prop_assert!(!codec.is_descendant_of(&path, &path).unwrap());
        }
    }

    #[test]
    fn reparenting_rewrites_exactly_the_prefix(
        ids in prop::collection::vec(1u64..1 << 30, 2..5),
        new_parent_id in 1u64..1 << 30,
    ) {
        for codec in codecs_for(36) {
            let path = ids.iter().try_fold(NodePath::empty(), |parent, &id| codec.build(&parent, NodeId::new(id))).unwrap();
            let old_prefix = codec.truncate(&path, 1).unwrap();
            let new_prefix = codec.segment(NodeId::new(new_parent_id)).unwrap();
            let rewritten = codec.rewrite_prefix(&path, &old_prefix, &new_prefix).unwrap();

            let mut expected = vec![new_parent_id];
            expected.extend_from_slice(&ids[1..]);
            let decoded: Vec<u64> = codec.decode(&rewritten).unwrap().into_iter().map(NodeId::value).collect();
            prop_assert_eq!(decoded, expected);
        }
    }
}
