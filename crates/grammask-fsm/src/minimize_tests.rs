use crate::fsm::{Fsm, FsmWithStartEnd};

fn strings_up_to(alphabet: &[u8], max_len: usize) -> Vec<Vec<u8>> {
    let mut out = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..max_len {
        let mut next = Vec::new();
        for prefix in &frontier {
            for &byte in alphabet {
                let mut s = prefix.clone();
                s.push(byte);
                out.push(s.clone());
                next.push(s);
            }
        }
        frontier = next;
    }
    out
}

#[test]
fn minimize_preserves_language() {
    let nfa = FsmWithStartEnd::union(vec![
        FsmWithStartEnd::byte_string(b"ab").star(),
        FsmWithStartEnd::byte_string(b"a").plus(),
    ]);
    let dfa = nfa.to_dfa();
    let minimized = dfa.minimize_dfa();
    assert!(minimized.num_states() <= dfa.num_states());
    for input in strings_up_to(b"ab", 7) {
        assert_eq!(
            dfa.accepts_bytes(&input),
            minimized.accepts_bytes(&input),
            "input {input:?}"
        );
    }
}

#[test]
fn minimize_merges_equivalent_accepts() {
    // 0 --a--> 1(F), 0 --b--> 2(F): 1 and 2 are equivalent.
    let mut fsm = Fsm::with_states(3);
    fsm.add_edge(0, 1, b'a' as i16, b'a' as i16);
    fsm.add_edge(0, 2, b'b' as i16, b'b' as i16);
    let mut dfa = FsmWithStartEnd::new(fsm, 0);
    dfa.add_accept(1);
    dfa.add_accept(2);
    dfa.set_dfa(true);

    let minimized = dfa.minimize_dfa();
    assert_eq!(minimized.num_states(), 2);
    assert!(minimized.accepts_bytes(b"a"));
    assert!(minimized.accepts_bytes(b"b"));
    assert!(!minimized.accepts_bytes(b"ab"));
}

#[test]
fn minimize_trims_unreachable_and_dead_states() {
    // State 2 is unreachable; state 3 is reachable but dead.
    let mut fsm = Fsm::with_states(4);
    fsm.add_edge(0, 1, b'a' as i16, b'a' as i16);
    fsm.add_edge(2, 1, b'a' as i16, b'a' as i16);
    fsm.add_edge(0, 3, b'b' as i16, b'b' as i16);
    let mut dfa = FsmWithStartEnd::new(fsm, 0);
    dfa.add_accept(1);
    dfa.set_dfa(true);

    let minimized = dfa.minimize_dfa();
    assert_eq!(minimized.num_states(), 2);
    assert!(minimized.accepts_bytes(b"a"));
    assert!(!minimized.accepts_bytes(b"b"));
}

#[test]
fn minimize_empty_language() {
    let mut fsm = Fsm::with_states(2);
    fsm.add_edge(0, 1, b'a' as i16, b'a' as i16);
    let mut dfa = FsmWithStartEnd::new(fsm, 0);
    dfa.set_dfa(true);

    let minimized = dfa.minimize_dfa();
    assert_eq!(minimized.num_states(), 1);
    assert!(minimized.accepts().is_empty());
    assert!(!minimized.accepts_bytes(b""));
    assert!(!minimized.accepts_bytes(b"a"));
}

#[test]
fn minimize_identifier_dfa_is_small() {
    // [A-Za-z_][A-Za-z0-9_]* needs exactly two states.
    let head =
        FsmWithStartEnd::from_char_class(&[('A' as i32, 'Z' as i32), ('a' as i32, 'z' as i32), ('_' as i32, '_' as i32)], false)
            .unwrap();
    let tail = FsmWithStartEnd::from_char_class(
        &[
            ('A' as i32, 'Z' as i32),
            ('a' as i32, 'z' as i32),
            ('0' as i32, '9' as i32),
            ('_' as i32, '_' as i32),
        ],
        false,
    )
    .unwrap();
    let machine = FsmWithStartEnd::concat(vec![head, tail.star()]);
    let minimized = machine.to_dfa().minimize_dfa();
    assert_eq!(minimized.num_states(), 2);
    assert!(minimized.accepts_bytes(b"x"));
    assert!(minimized.accepts_bytes(b"_0"));
    assert!(!minimized.accepts_bytes(b"9a"));
}

#[test]
fn minimize_keeps_rule_ref_distinction() {
    // Accept-equivalent states with different outgoing rule references
    // must not merge.
    let mut fsm = Fsm::with_states(4);
    fsm.add_edge(0, 1, b'a' as i16, b'a' as i16);
    fsm.add_edge(0, 2, b'b' as i16, b'b' as i16);
    fsm.add_rule_ref(1, 3, 5);
    fsm.add_rule_ref(2, 3, 6);
    let mut dfa = FsmWithStartEnd::new(fsm, 0);
    dfa.add_accept(3);
    dfa.set_dfa(true);

    let minimized = dfa.minimize_dfa();
    // 0, 1, 2, 3 all survive: 1 and 2 differ on their rule symbol.
    assert_eq!(minimized.num_states(), 4);
}
