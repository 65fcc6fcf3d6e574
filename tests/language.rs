// tests/language.rs
use glam::DVec2;
use logo_robot::{
    BaseTurtle, EvalError, Evaluate, HardwareError, Interpreter, RuntimeError, Scalar, Scope,
    Turtle, TurtleState, parse, parse_expression,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io;

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Move(f64),
    Rotate(f64),
    Pen(bool),
}

/// Kinematic turtle that also remembers every call it received.
#[derive(Default)]
struct RecordingTurtle {
    base: BaseTurtle,
    calls: Vec<Call>,
}

impl Turtle for RecordingTurtle {
    fn move_steps(&mut self, steps: f64) -> Result<DVec2, HardwareError> {
        self.calls.push(Call::Move(steps));
        self.base.move_steps(steps)
    }

    fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError> {
        self.calls.push(Call::Rotate(deg));
        self.base.rotate(deg)
    }

    fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError> {
        self.calls.push(Call::Pen(state));
        self.base.pen_up(state)
    }

    fn state(&self) -> TurtleState {
        self.base.state()
    }
}

fn setup(source: &str) -> (RecordingTurtle, Result<(), RuntimeError>) {
    let program = parse(source).expect("program should parse");
    let mut turtle = RecordingTurtle::default();
    let result =
        Interpreter::new().run(&program, &mut turtle, &mut io::empty(), &mut io::sink());
    (turtle, result)
}

fn eval(source: &str) -> Result<Scalar, EvalError> {
    parse_expression(source)
        .expect("expression should parse")
        .evaluate(&Scope::default())
}

#[test]
fn test_forward_from_origin() {
    let (turtle, result) = setup("FORWARD 10\n");
    result.unwrap();

    let state = turtle.state();
    assert_eq!(state.x(), 10.0);
    assert_eq!(state.y(), 0.0);
    assert_eq!(state.heading, 0.0);
}

#[test]
fn test_right_turns_accumulate() {
    let mut turtle = RecordingTurtle::default();
    let interpreter = Interpreter::new();
    let program = parse("RIGHT 90\n").unwrap();

    interpreter
        .run(&program, &mut turtle, &mut io::empty(), &mut io::sink())
        .unwrap();
    assert_eq!(turtle.state().heading, 90.0, "First turn faces 90");

    interpreter
        .run(&program, &mut turtle, &mut io::empty(), &mut io::sink())
        .unwrap();
    assert_eq!(turtle.state().heading, 180.0, "Second run keeps the turtle");
}

#[test]
fn test_repeat_runs_body_in_order() {
    let (turtle, result) = setup("REPEAT 3 [ FORWARD 1 RIGHT 120 ]\n");
    result.unwrap();

    // Body: Move then Rotate, three times over.
    let expected: Vec<Call> = (0..3)
        .flat_map(|_| [Call::Move(1.0), Call::Rotate(120.0)])
        .collect();
    assert_eq!(turtle.calls, expected);
}

#[test]
fn test_nested_repeat_multiplies() {
    let (turtle, result) = setup("REPEAT 2 [\n  REPEAT 3 [ RT 1 ]\n  FD 1\n]\n");
    result.unwrap();

    let rotates = turtle
        .calls
        .iter()
        .filter(|call| matches!(call, Call::Rotate(_)))
        .count();
    assert_eq!(rotates, 6);
    assert_eq!(turtle.calls.len(), 8);
}

#[rstest]
#[case("2 + 3 * 4", 14.0)]
#[case("2 ^ 3", 8.0)]
#[case("(2 + 3) * 4", 20.0)]
#[case("2 * 3 ^ 2", 18.0)]
#[case("10 / 4", 2.5)]
fn test_precedence(#[case] source: &str, #[case] expected: f64) {
    assert_eq!(eval(source).unwrap(), Scalar::Number(expected));
}

#[test]
fn test_string_ordering() {
    assert_eq!(eval(r#""a" < "b""#).unwrap(), Scalar::Bool(true));
}

#[test]
fn test_number_compared_with_string_is_type_error() {
    let err = eval(r#"5 < "x""#).unwrap_err();
    assert!(matches!(err, EvalError::TypeError { .. }), "{err}");
}

#[test]
fn test_unknown_variable_aborts_run() {
    let (turtle, result) = setup("FD 5\nRT distance\nFD 7\nPU\n");

    match result.unwrap_err() {
        RuntimeError::Eval(EvalError::UnknownVariable { name, pos }) => {
            assert_eq!(name, "distance");
            assert_eq!(pos.line, 2);
        }
        other => panic!("expected unknown variable, got {other}"),
    }
    // Only the command before the failure reached the turtle.
    assert_eq!(turtle.calls, vec![Call::Move(5.0)]);
}

#[test]
fn test_pen_round_trip() {
    let (turtle, result) = setup("PENUP\nPENDOWN\n");
    result.unwrap();

    assert_eq!(turtle.calls, vec![Call::Pen(true), Call::Pen(false)]);
    assert_eq!(turtle.state().pen_up, TurtleState::default().pen_up);
}

#[test]
fn test_comments_and_stop_do_nothing() {
    let (turtle, result) = setup("REM draw nothing\n# still nothing\nSTOP\n");
    result.unwrap();
    assert!(turtle.calls.is_empty());
}

#[test]
fn test_string_operand_is_rejected_by_command() {
    let (turtle, result) = setup("FD \"far\"\n");
    assert!(matches!(
        result,
        Err(RuntimeError::Eval(EvalError::TypeError { .. }))
    ));
    assert!(turtle.calls.is_empty());
}

#[test]
fn test_execute_reports_parse_errors() {
    let mut turtle = BaseTurtle::new();
    let err = logo_robot::execute("JUMP 3\n", &mut turtle).unwrap_err();
    assert!(matches!(err, logo_robot::Error::Parse(_)), "{err}");
}
