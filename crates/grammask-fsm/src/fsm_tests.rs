use rustc_hash::FxHashMap;

use crate::edge::FsmLabel;
use crate::fsm::{Fsm, FsmWithStartEnd};

#[test]
fn edge_label_kinds() {
    assert!(FsmLabel::epsilon().is_epsilon());
    assert!(!FsmLabel::epsilon().is_rule_ref());
    assert!(FsmLabel::rule_ref(3).is_rule_ref());
    assert_eq!(FsmLabel::rule_ref(3).rule_id(), Some(3));
    assert!(FsmLabel::range(0, 255).is_char_range());
    assert!(FsmLabel::byte(b'a').covers(b'a' as i16));
    assert!(!FsmLabel::byte(b'a').covers(b'b' as i16));
}

#[test]
fn add_states_and_edges() {
    let mut fsm = Fsm::new();
    let s0 = fsm.add_state();
    let s1 = fsm.add_state();
    fsm.add_edge(s0, s1, b'a' as i16, b'z' as i16);
    fsm.add_epsilon(s0, s1);
    fsm.add_rule_ref(s1, s0, 7);

    assert_eq!(fsm.num_states(), 2);
    let edges = fsm.edges_from(s0);
    assert_eq!(edges.len(), 2);
    assert!(edges[0].is_char_range());
    assert!(edges[1].is_epsilon());
    assert_eq!(fsm.edges_from(s1)[0].rule_id(), Some(7));
    assert!(fsm.well_formed());
}

#[test]
fn get_next_state_first_match_wins() {
    let mut fsm = Fsm::with_states(3);
    fsm.add_edge(0, 1, b'a' as i16, b'z' as i16);
    fsm.add_edge(0, 2, b'a' as i16, b'a' as i16);
    assert_eq!(fsm.get_next_state(0, b'a' as i16), Some(1));
    assert_eq!(fsm.get_next_state(0, b'0' as i16), None);
}

#[test]
fn epsilon_closure_follows_chains() {
    let mut fsm = Fsm::with_states(5);
    fsm.add_epsilon(0, 1);
    fsm.add_epsilon(1, 2);
    fsm.add_edge(2, 3, 0, 255);
    fsm.add_epsilon(4, 0);

    let mut states = vec![0];
    fsm.epsilon_closure(&mut states);
    assert_eq!(states, vec![0, 1, 2]);

    let mut states = vec![4];
    fsm.epsilon_closure(&mut states);
    assert_eq!(states, vec![4, 0, 1, 2]);
}

#[test]
fn advance_closes_input_when_asked() {
    // 0 --eps--> 1 --a--> 2
    let mut fsm = Fsm::with_states(3);
    fsm.add_epsilon(0, 1);
    fsm.add_edge(1, 2, b'a' as i16, b'a' as i16);

    assert_eq!(fsm.advance(&[0], b'a' as i32, false, false), vec![2]);
    // Already-closed input is taken as-is: state 0 alone has no 'a' edge.
    assert_eq!(fsm.advance(&[0], b'a' as i32, true, false), Vec::<i32>::new());
}

#[test]
fn advance_on_rule_ids() {
    let mut fsm = Fsm::with_states(3);
    fsm.add_rule_ref(0, 1, 4);
    fsm.add_rule_ref(0, 2, 9);
    assert_eq!(fsm.advance(&[0], 4, true, true), vec![1]);
    assert_eq!(fsm.advance(&[0], 9, true, true), vec![2]);
    assert_eq!(fsm.advance(&[0], 5, true, true), Vec::<i32>::new());
}

#[test]
fn possible_rules_collects_labels() {
    let mut fsm = Fsm::with_states(2);
    fsm.add_rule_ref(0, 1, 2);
    fsm.add_rule_ref(0, 1, 5);
    fsm.add_edge(0, 1, 0, 10);
    let rules = fsm.possible_rules(0);
    assert_eq!(rules.len(), 2);
    assert!(rules.contains(&2));
    assert!(rules.contains(&5));
}

#[test]
fn absorb_renumbers_states() {
    let mut a = Fsm::with_states(1);
    let mut b = Fsm::with_states(2);
    b.add_edge(0, 1, b'x' as i16, b'x' as i16);

    let mut mapping = FxHashMap::default();
    a.absorb(&b, &mut mapping);
    assert_eq!(a.num_states(), 3);
    assert_eq!(mapping[&0], 1);
    assert_eq!(mapping[&1], 2);
    assert_eq!(a.edges_from(1)[0].target, 2);
}

#[test]
fn rebuild_with_mapping_drops_unmapped() {
    let mut fsm = Fsm::with_states(3);
    fsm.add_edge(0, 1, 0, 0);
    fsm.add_edge(1, 2, 1, 1);

    let mut mapping = FxHashMap::default();
    mapping.insert(0, 0);
    mapping.insert(1, 1);
    let rebuilt = fsm.rebuild_with_mapping(&mapping, 2);
    assert_eq!(rebuilt.num_states(), 2);
    assert_eq!(rebuilt.edges_from(0).len(), 1);
    assert_eq!(rebuilt.edges_from(1).len(), 0);
}

#[test]
fn accepts_bytes_simulates_nfa() {
    let mut fsm = Fsm::with_states(3);
    fsm.add_edge(0, 1, b'a' as i16, b'a' as i16);
    fsm.add_epsilon(1, 2);
    fsm.add_edge(2, 2, b'b' as i16, b'b' as i16);
    let mut machine = FsmWithStartEnd::new(fsm, 0);
    machine.add_accept(2);

    assert!(machine.accepts_bytes(b"a"));
    assert!(machine.accepts_bytes(b"ab"));
    assert!(machine.accepts_bytes(b"abbb"));
    assert!(!machine.accepts_bytes(b""));
    assert!(!machine.accepts_bytes(b"b"));
    assert!(!machine.accepts_bytes(b"aba"));
}

#[test]
fn check_dfa_detects_overlap_and_epsilon() {
    let mut fsm = Fsm::with_states(2);
    fsm.add_edge(0, 1, 0, 10);
    fsm.add_edge(0, 1, 20, 30);
    let mut machine = FsmWithStartEnd::new(fsm, 0);
    assert!(machine.check_dfa());

    machine.fsm_mut().add_edge(0, 1, 5, 6);
    assert!(!machine.check_dfa());

    let mut fsm = Fsm::with_states(2);
    fsm.add_epsilon(0, 1);
    let mut machine = FsmWithStartEnd::new(fsm, 0);
    assert!(!machine.check_dfa());
}

#[test]
fn freeze_sorts_and_dedups_rows() {
    let mut fsm = Fsm::with_states(2);
    fsm.add_edge(0, 1, 20, 30);
    fsm.add_edge(0, 1, 0, 10);
    fsm.add_edge(0, 1, 0, 10);
    fsm.add_epsilon(0, 1);
    let compact = fsm.freeze();

    let row = compact.edges_from(0);
    assert_eq!(row.len(), 3);
    assert!(row[0].is_epsilon());
    assert_eq!((row[1].min, row[1].max), (0, 10));
    assert_eq!((row[2].min, row[2].max), (20, 30));
}

#[test]
fn compact_transition_linear_and_binary() {
    // 20 disjoint ranges force the binary-search path.
    let mut fsm = Fsm::with_states(21);
    for i in 0..20i16 {
        fsm.add_edge(0, (i + 1) as i32, i * 10, i * 10 + 5);
    }
    let mut machine = FsmWithStartEnd::new(fsm, 0);
    machine.add_accept(1);
    machine.set_dfa(true);
    let compact = machine.freeze();

    assert_eq!(compact.transition(0, 0), 1);
    assert_eq!(compact.transition(0, 15), 2);
    assert_eq!(compact.transition(0, 193), 20);
    assert_eq!(compact.transition(0, 7), crate::NO_TRANSITION);
    assert_eq!(compact.transition(1, 0), crate::NO_TRANSITION);

    // Short rows go through the linear path.
    let mut fsm = Fsm::with_states(2);
    fsm.add_edge(0, 1, b'a' as i16, b'z' as i16);
    let machine = FsmWithStartEnd::new(fsm, 0);
    let compact = machine.freeze();
    assert_eq!(compact.transition(0, b'm' as i16), 1);
    assert_eq!(compact.transition(0, b'A' as i16), crate::NO_TRANSITION);
}

#[test]
fn compact_round_trip_preserves_language() {
    let mut fsm = Fsm::with_states(2);
    fsm.add_edge(0, 1, b'a' as i16, b'b' as i16);
    let mut machine = FsmWithStartEnd::new(fsm, 0);
    machine.add_accept(1);

    let compact = machine.clone().freeze();
    assert!(compact.accepts_bytes(b"a"));
    assert!(compact.accepts_bytes(b"b"));
    assert!(!compact.accepts_bytes(b"c"));
    assert!(compact.memory_size() > 0);

    let thawed = compact.thaw();
    assert!(thawed.accepts_bytes(b"a"));
    assert!(!thawed.accepts_bytes(b"ab"));
}
