mod common;

use flowforge::core::construct::Construct;
use flowforge::core::encoder::Condition;
use flowforge::core::error::{FlowErrorKind, StackKind};
use flowforge::flow::FlowCompiler;

use common::z80sim::{
    ccf, compile, cp, dec_a, inc_a, ld_a, ld_b, marker, nop, run, scf, z80_compiler,
};

fn emit(flow: &mut FlowCompiler, bytes: &[u8]) {
    flow.emit(bytes).expect("emit");
}

#[test]
fn if_without_else_skips_body_when_condition_fails() {
    for (a, expected) in [(5u8, vec![1u8, 2]), (4, vec![2])] {
        let code = compile(0x0100, |flow| {
            emit(flow, &ld_a(a));
            emit(flow, &cp(5));
            flow.if_open(Condition::Zero).unwrap();
            emit(flow, &marker(1));
            flow.end_if().unwrap();
            emit(flow, &marker(2));
        });
        assert_eq!(run(&code).unwrap(), expected, "A={a}");
    }
}

#[test]
fn if_else_runs_exactly_one_arm() {
    for (carry, expected) in [(true, vec![1u8, 3]), (false, vec![2, 3])] {
        let code = compile(0x0200, |flow| {
            emit(flow, &scf());
            if !carry {
                emit(flow, &ccf());
            }
            flow.if_open(Condition::Carry).unwrap();
            emit(flow, &marker(1));
            flow.else_branch().unwrap();
            emit(flow, &marker(2));
            flow.end_if().unwrap();
            emit(flow, &marker(3));
        });
        assert_eq!(run(&code).unwrap(), expected, "carry={carry}");
    }
}

#[test]
fn if_else_layout_patches_only_the_two_operands() {
    let mut flow = z80_compiler(0x4000);
    flow.if_open(Condition::NotZero).unwrap();
    emit(&mut flow, &[0xA1, 0xA2]);
    flow.else_branch().unwrap();
    emit(&mut flow, &[0xB1]);
    flow.end_if().unwrap();
    let code = flow.finish().unwrap();
    // [JR NZ,L1][JP L2][L1: A][JP L3][L2: B][L3:]
    let l2 = 0x4000 + 2 + 3 + 2 + 3;
    let l3 = l2 + 1;
    assert_eq!(
        code.bytes(),
        &[
            0x20, 0x03, 0xC3, l2 as u8, (l2 >> 8) as u8, 0xA1, 0xA2, 0xC3, l3 as u8,
            (l3 >> 8) as u8, 0xB1
        ]
    );
    assert_eq!(code.patch_count(), 2);
    assert_eq!(code.here(), l3);
}

#[test]
fn sign_condition_uses_absolute_skip_branch() {
    for (a, expected) in [(0x80u8, vec![1u8]), (0x01, vec![])] {
        let code = compile(0, |flow| {
            emit(flow, &ld_a(a));
            emit(flow, &cp(0));
            flow.if_open(Condition::Minus).unwrap();
            emit(flow, &marker(1));
            flow.end_if().unwrap();
        });
        assert_eq!(run(&code).unwrap(), expected);
    }
}

#[test]
fn switch_runs_one_arm_and_reaches_the_single_exit() {
    let cases = [(1u8, 10u8), (2, 20), (3, 30)];
    let build = |a: u8| {
        compile(0x0300, |flow| {
            emit(flow, &ld_a(a));
            flow.switch_open().unwrap();
            for (value, mark) in cases {
                emit(flow, &cp(value));
                flow.case_test(Condition::Zero).unwrap();
                emit(flow, &marker(mark));
                flow.end_case().unwrap();
            }
            emit(flow, &marker(99));
            flow.end_switch().unwrap();
            emit(flow, &marker(0xFF));
        })
    };
    for (a, mark) in cases {
        assert_eq!(run(&build(a)).unwrap(), vec![mark, 0xFF], "A={a}");
    }
    assert_eq!(run(&build(7)).unwrap(), vec![99, 0xFF]);
}

#[test]
fn empty_switch_falls_through() {
    let code = compile(0, |flow| {
        flow.switch_open().unwrap();
        flow.end_switch().unwrap();
        emit(flow, &marker(1));
    });
    assert_eq!(run(&code).unwrap(), vec![1]);
}

#[test]
fn do_while_runs_zero_or_more_times() {
    for count in [0u8, 1, 3] {
        let code = compile(0x0100, |flow| {
            emit(flow, &ld_a(count));
            flow.do_open().unwrap();
            emit(flow, &cp(0));
            flow.while_cond(Condition::NotZero).unwrap();
            emit(flow, &marker(1));
            emit(flow, &dec_a());
            flow.end_do().unwrap();
            emit(flow, &marker(2));
        });
        let mut expected: Vec<u8> = vec![1; usize::from(count)];
        expected.push(2);
        assert_eq!(run(&code).unwrap(), expected, "count={count}");
    }
}

#[test]
fn do_until_exits_when_condition_first_holds() {
    let code = compile(0, |flow| {
        emit(flow, &ld_a(0));
        flow.do_open().unwrap();
        emit(flow, &marker(1));
        emit(flow, &inc_a());
        emit(flow, &cp(3));
        flow.until_cond(Condition::Zero).unwrap();
        flow.end_do().unwrap();
        emit(flow, &marker(2));
    });
    assert_eq!(run(&code).unwrap(), vec![1, 1, 1, 2]);
}

#[test]
fn multiple_exit_tests_share_one_exit() {
    // Leaves when A reaches 5 or carry is set by the second test.
    let code = compile(0, |flow| {
        emit(flow, &ld_a(0));
        flow.do_open().unwrap();
        emit(flow, &inc_a());
        emit(flow, &cp(5));
        flow.while_cond(Condition::NotZero).unwrap();
        emit(flow, &cp(3));
        flow.while_cond(Condition::Carry).unwrap();
        emit(flow, &marker(1));
        flow.end_do().unwrap();
        emit(flow, &marker(2));
    });
    assert_eq!(run(&code).unwrap(), vec![1, 1, 2]);
}

#[test]
fn forever_exits_only_through_break() {
    let mut flow = z80_compiler(0);
    emit(&mut flow, &ld_a(0));
    flow.do_open().unwrap();
    emit(&mut flow, &marker(1));
    emit(&mut flow, &inc_a());
    emit(&mut flow, &cp(2));
    flow.if_open(Condition::Zero).unwrap();
    flow.break_loop().unwrap();
    flow.end_if().unwrap();
    flow.forever().unwrap();
    emit(&mut flow, &marker(2));
    assert!(flow.warnings().is_empty());
    let code = flow.finish().unwrap();
    assert_eq!(run(&code).unwrap(), vec![1, 1, 2]);
}

#[test]
fn break_after_exit_test_chains_through_the_exit() {
    let code = compile(0, |flow| {
        emit(flow, &ld_a(0));
        flow.do_open().unwrap();
        emit(flow, &inc_a());
        emit(flow, &cp(9));
        flow.while_cond(Condition::NotZero).unwrap();
        emit(flow, &cp(2));
        flow.if_open(Condition::Zero).unwrap();
        flow.break_loop().unwrap();
        flow.end_if().unwrap();
        emit(flow, &marker(1));
        flow.end_do().unwrap();
        emit(flow, &marker(2));
    });
    assert_eq!(run(&code).unwrap(), vec![1, 2]);
}

#[test]
fn continue_lands_on_the_loop_anchor() {
    let code = compile(0, |flow| {
        emit(flow, &ld_a(0));
        flow.do_open().unwrap();
        emit(flow, &inc_a());
        emit(flow, &cp(4));
        flow.while_cond(Condition::NotZero).unwrap();
        emit(flow, &cp(2));
        flow.if_open(Condition::Zero).unwrap();
        flow.continue_loop().unwrap();
        flow.end_if().unwrap();
        emit(flow, &marker(5));
        flow.end_do().unwrap();
        emit(flow, &marker(9));
    });
    assert_eq!(run(&code).unwrap(), vec![5, 5, 9]);
}

#[test]
fn counted_loop_runs_body_n_times() {
    for n in 1u8..=5 {
        let code = compile(0x0100, |flow| {
            emit(flow, &ld_b(n));
            flow.do_open().unwrap();
            emit(flow, &marker(1));
            flow.counted_loop().unwrap();
            emit(flow, &marker(2));
        });
        let mut expected: Vec<u8> = vec![1; usize::from(n)];
        expected.push(2);
        assert_eq!(run(&code).unwrap(), expected, "n={n}");
    }
}

#[test]
fn nested_loops_break_their_own_level() {
    let code = compile(0, |flow| {
        emit(flow, &ld_b(2));
        flow.do_open().unwrap();
        emit(flow, &ld_a(0));
        flow.do_open().unwrap();
        emit(flow, &inc_a());
        emit(flow, &cp(3));
        flow.if_open(Condition::Zero).unwrap();
        flow.break_loop().unwrap();
        flow.end_if().unwrap();
        emit(flow, &marker(1));
        flow.forever().unwrap();
        emit(flow, &marker(2));
        flow.counted_loop().unwrap();
        emit(flow, &marker(3));
    });
    assert_eq!(run(&code).unwrap(), vec![1, 1, 2, 1, 1, 2, 3]);
}

#[test]
fn balanced_program_returns_both_stacks_to_zero() {
    let mut flow = z80_compiler(0);
    flow.do_open().unwrap();
    flow.switch_open().unwrap();
    flow.case_test(Condition::Carry).unwrap();
    flow.if_open(Condition::Zero).unwrap();
    flow.break_loop().unwrap();
    flow.else_branch().unwrap();
    flow.continue_loop().unwrap();
    flow.end_if().unwrap();
    flow.end_case().unwrap();
    flow.end_switch().unwrap();
    emit(&mut flow, &nop());
    flow.until_cond(Condition::Carry).unwrap();
    flow.end_do().unwrap();
    assert_eq!(flow.control_depth(), 0);
    assert_eq!(flow.loop_depth(), 0);
    let code = flow.finish().unwrap();
    assert_eq!(code.unresolved_count(), 0);
}

#[test]
fn unresolved_if_is_reported_at_its_line() {
    let mut flow = z80_compiler(0);
    flow.set_line(4);
    flow.if_open(Condition::Zero).unwrap();
    flow.set_line(5);
    emit(&mut flow, &nop());
    let err = flow.finish().unwrap_err();
    assert_eq!(err.line(), 4);
    assert!(matches!(
        err.kind(),
        FlowErrorKind::UnresolvedReferenceAtEnd {
            count: 1,
            opened_by: Some(Construct::If)
        }
    ));
}

#[test]
fn thirteenth_nested_if_overflows_the_control_stack() {
    let mut flow = z80_compiler(0);
    for _ in 0..12 {
        flow.if_open(Condition::Zero).unwrap();
    }
    let err = flow.if_open(Condition::Zero).unwrap_err();
    assert_eq!(
        err.kind(),
        &FlowErrorKind::StackOverflow {
            stack: StackKind::Control,
            capacity: 12
        }
    );
    assert_eq!(flow.control_depth(), 12);
}

#[test]
fn break_outside_loop_is_rejected_even_inside_if() {
    let mut flow = z80_compiler(0);
    flow.if_open(Condition::Zero).unwrap();
    let err = flow.break_loop().unwrap_err();
    assert_eq!(err.code(), "flw206");
    let err = flow.continue_loop().unwrap_err();
    assert_eq!(err.code(), "flw206");
}

#[test]
fn mismatched_close_kinds_are_rejected() {
    let mut flow = z80_compiler(0);
    flow.switch_open().unwrap();
    assert!(flow.end_if().is_err());
    assert!(flow.end_case().is_err());
    flow.do_open().unwrap();
    assert!(flow.end_switch().is_ok());
    assert!(flow.end_do().is_ok());
}
