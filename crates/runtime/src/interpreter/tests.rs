use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use pretty_assertions::assert_eq;

use tools::errors::ErrorKind;

use super::*;
use crate::values::Number;

// Collects what the program prints
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

struct Run {
    result: Result<Vec<Value>, RunError>,
    output: String,
}

impl Run {
    fn values(&self) -> &[Value] {
        match &self.result {
            Ok(values) => values,
            Err(e) => panic!("program failed:\n{}", e),
        }
    }

    fn last(&self) -> Value {
        self.values().last().cloned().unwrap_or_else(Value::null)
    }

    fn error(&self) -> &RunError {
        match &self.result {
            Ok(values) => panic!("program succeeded with {:?}", values),
            Err(e) => e,
        }
    }
}

fn run_with(config: Config, source: &str) -> Run {
    let buffer = SharedBuffer::default();
    let interp = Interpreter::with_output(config, Box::new(buffer.clone()));
    let ctx = interp.global_context("<program>");

    let result = interp.run(source, "<test>", &ctx);

    Run {
        result,
        output: buffer.contents(),
    }
}

fn exec(source: &str) -> Run {
    run_with(Config::default(), source)
}

fn last_value(source: &str) -> Value {
    exec(source).last()
}

fn list(values: &[i64]) -> Value {
    Value::new_list(values.iter().map(|v| Value::int(*v)).collect())
}

#[test]
fn precedence() {
    assert_eq!(last_value("1 + 2 * 3"), Value::int(7));
    assert_eq!(last_value("(1 + 2) * 3"), Value::int(9));
    assert_eq!(last_value("2 ^ 3 ^ 2"), Value::float(512.));
    assert_eq!(last_value("-2 + 5"), Value::int(3));
    assert_eq!(last_value("1 < 2 and 3 > 4"), Value::int(0));
    assert_eq!(last_value("not 1 == 2"), Value::int(1));
}

#[test]
fn integer_and_float_division() {
    let int = last_value("3 / 2");
    assert!(matches!(int, Value::Number(Number::Int(1))), "{:?}", int);

    let float = last_value("3.0 / 2");
    assert!(matches!(float, Value::Number(Number::Float(f)) if f == 1.5), "{:?}", float);

    let run = exec("5 / 0");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(run.error().details(), "Division by zero");
}

#[test]
fn integer_overflow_is_an_error() {
    let run = exec("9223372036854775807 + 1");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(run.error().details(), "Integer overflow");
}

#[test]
fn each_statement_gives_a_value() {
    let run = exec("var a = 2\nvar b = a * 5\nb - 1");
    assert_eq!(run.values(), &[Value::int(2), Value::int(10), Value::int(9)]);
}

#[test]
fn undefined_variable() {
    let run = exec("var a = 1\nb");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(run.error().details(), "'b' is not defined");
}

#[test]
fn illegal_operations() {
    let run = exec("'a' - 1");
    assert_eq!(run.error().kind(), ErrorKind::Type);
    assert_eq!(
        run.error().details(),
        "Illegal operation '-' between 'String' and 'Number'"
    );

    assert_eq!(last_value("'ab' * 3"), Value::string("ababab"));
    assert_eq!(last_value("[1] == 'a'"), Value::int(0));
}

#[test]
fn operand_errors_stop_before_the_right_side() {
    let run = exec("nope + println('x')");
    assert_eq!(run.error().details(), "'nope' is not defined");
    assert_eq!(run.output, "");
}

#[test]
fn string_repetition_is_bounded() {
    assert_eq!(last_value("'ab' * -2"), Value::string(""));
    assert_eq!(last_value("'' * 9223372036854775807"), Value::string(""));

    let run = exec("'ab' * 9223372036854775807");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(run.error().details(), "String repetition is longer than 268435456 bytes");
}

#[test]
fn list_operators_copy_but_set_mutates() {
    let run = exec(
        "var L = [1, 2, 3]
var M = L + 4
var before = L
set(L, 0, 9)
L",
    );

    let values = run.values();
    assert_eq!(values[1], list(&[1, 2, 3, 4]));
    assert_eq!(values[4], list(&[9, 2, 3]));
    // Variables alias the same list
    assert_eq!(values[2], list(&[9, 2, 3]));
}

#[test]
fn list_helpers() {
    assert_eq!(last_value("var L = [1, 2]\nappend(L, 3)\nL"), list(&[1, 2, 3]));
    assert_eq!(last_value("concat([1], [2, 3])"), list(&[1, 2, 3]));
    assert_eq!(last_value("var L = [1, 2, 3]\nremove(L, 1)"), Value::int(2));
    assert_eq!(last_value("[1, 2, 3] - 0"), list(&[2, 3]));
    assert_eq!(last_value("[1, 2, 3] / 2"), Value::int(3));
    assert_eq!(last_value("[1, 2, 3][-1]"), Value::int(3));
    assert_eq!(last_value("range(2, 8, 3)"), list(&[2, 5]));
    assert_eq!(last_value("range(3)"), list(&[0, 1, 2]));

    let run = exec("set([1, 2], -1, 0)");
    assert_eq!(run.error().details(), "Negative index not allowed here");

    let run = exec("[1, 2][2]");
    assert_eq!(
        run.error().details(),
        "List index out of range (given 2 but maximum is 1)"
    );
}

#[test]
fn self_containing_collections_render() {
    assert_eq!(last_value("var L = [1]\nappend(L, L)\nstr(L)"), Value::string("[1, [...]]"));
    assert_eq!(
        last_value("var L = [1]\nappend(L, L)\nstr([L, L])"),
        Value::string("[[1, [...]], [1, [...]]]")
    );
    assert_eq!(
        last_value("var d = {'a': 1}\nd['self'] = d\nstr(d)"),
        Value::string("{'a': 1, 'self': {...}}")
    );
}

#[test]
fn chained_assignment_writes_through_aliases() {
    let run = exec(
        "var a = {'b': [1, 2]}
var c = a
a.b[0] = 9
[c.b, 4]",
    );

    assert_eq!(run.last(), Value::new_list(vec![list(&[9, 2]), Value::int(4)]));
    assert_eq!(run.output, "");
}

#[test]
fn dictionary_keys_compared_with_the_dictionary_itself() {
    assert_eq!(last_value("var d = {{}: 1}\nd[{}] = 5\nd[{}]"), Value::int(5));

    let run = exec("var d = {{}: 1}\nd[d] = 2");
    assert_eq!(run.error().kind(), ErrorKind::Type);
    assert_eq!(run.error().details(), "Invalid key type");

    let run = exec("var d = {[{}]: 1}\nd[[d]] = 2");
    assert_eq!(run.error().details(), "Invalid key type");
}

#[test]
fn closures_start_from_the_captured_value() {
    let run = exec(
        "function outer()
    var x = 0
    function inner()
        nonlocal x
        var x = x + 1
        println(x)
    end
    return inner
end
var f = outer()
f()
f()",
    );

    run.values();
    assert_eq!(run.output, "1\n1\n");
}

#[test]
fn closures_capture_at_definition() {
    let run = exec(
        "function counter(start)
    var count = start
    function show()
        nonlocal count
        return count
    end
    var count = 100
    return show
end
counter(5)()",
    );

    assert_eq!(run.last(), Value::int(5));
}

#[test]
fn missing_nonlocal_binding() {
    let run = exec(
        "function outer()
    function inner()
        nonlocal x
        return x
    end
    return inner()
end
outer()",
    );

    assert_eq!(run.error().details(), "No binding for nonlocal 'x' found");
}

#[test]
fn deferred_expressions_run_in_order() {
    let run = exec(
        "function f()
    defer println(1)
    defer println(2)
    defer println(3)
    println('body')
    return 'done'
end
println(f())",
    );

    run.values();
    assert_eq!(run.output, "body\n1\n2\n3\ndone\n");
}

#[test]
fn deferred_expressions_see_final_values() {
    let run = exec(
        "function f()
    var i = 1
    defer println(i)
    var i = 2
end
f()",
    );

    run.values();
    assert_eq!(run.output, "2\n");
}

#[test]
fn recover_replaces_the_error() {
    let run = exec(
        "function risky()
    defer println(recover('saved')['message'])
    panic('boom')
    return 'unreachable'
end
risky()",
    );

    assert_eq!(run.last(), Value::string("saved"));
    assert_eq!(run.output, "boom\n");
}

#[test]
fn recover_without_error_is_null() {
    let run = exec(
        "function calm()
    defer println(recover(5))
    return 1
end
calm()",
    );

    assert_eq!(run.last(), Value::int(1));
    assert_eq!(run.output, "0\n");
}

#[test]
fn unrecovered_error_runs_every_deferred_expression() {
    let run = exec(
        "function f()
    defer println('first')
    defer println('second')
    panic('boom')
end
f()",
    );

    assert_eq!(run.output, "first\nsecond\n");
    assert_eq!(run.error().kind(), ErrorKind::Panic);
    assert_eq!(run.error().details(), "boom");
}

#[test]
fn deferred_errors_are_chained() {
    let run = exec(
        "function f()
    defer undefinedName
    panic('boom')
end
f()",
    );

    match run.error() {
        RunError::Runtime(e) => {
            assert_eq!(e.details, "'undefinedName' is not defined");
            let cause = e.cause.as_ref().map(|c| c.details.clone());
            assert_eq!(cause.as_deref(), Some("boom"));

            let rendered = e.to_string();
            assert!(rendered.contains("Above exception is the direct cause of the following exception"));
            assert!(rendered.contains("at <deferred>"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn stack_overflow_names_the_limit() {
    let run = exec("function f() -> f()\nf()");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(run.error().details(), "Maximum call stack depth (30) exceeded");

    let config = Config {
        max_call_depth: 5,
        ..Config::default()
    };
    let run = run_with(config, "function f(n) -> f(n + 1)\nf(0)");
    assert_eq!(run.error().details(), "Maximum call stack depth (5) exceeded");
}

#[test]
fn depth_is_restored_after_errors() {
    let buffer = SharedBuffer::default();
    let interp = Interpreter::with_output(Config::default(), Box::new(buffer));
    let ctx = interp.global_context("<program>");

    assert!(interp.run("function f() -> f()\nf()", "<test>", &ctx).is_err());
    assert_eq!(interp.depth.get(), 0);

    let values = interp.run(
        "function down(n)\n    if n == 0 then return 0\n    return down(n - 1)\nend\ndown(20)",
        "<test>",
        &ctx,
    );
    assert_eq!(values.ok().and_then(|v| v.last().cloned()), Some(Value::int(0)));
}

#[test]
fn prototypes_and_methods() {
    let run = exec(
        "var Point = {
    '__cls__': 'Point',
    '__init__': function(self, x, y)
        self.x = x
        self.y = y
    end,
    'sum': function(self) -> self.x + self.y
}
var p = new Point(1, 2)
var q = Point(10, 20)
p.x = 5
[p.sum(), q.sum(), p.x]",
    );

    assert_eq!(run.last(), list(&[7, 30, 5]));
}

#[test]
fn prototypes_reached_through_attributes() {
    let run = exec(
        "var ns = {
    'Proto': {
        '__cls__': 'Proto',
        '__init__': function(self, x)
            self.x = x
        end
    }
}
var p = new ns.Proto(3)
var q = new ns.Proto(4)
[p.x, q.x]",
    );

    assert_eq!(run.last(), list(&[3, 4]));
}

#[test]
fn missing_constructor_fails_at_instantiation() {
    let run = exec("var P = {'__cls__': 'Point', 'x': 1}\nnew P()");
    assert_eq!(run.error().kind(), ErrorKind::Type);
    assert_eq!(run.error().details(), "Prototype of object 'Point' has no constructor");

    let run = exec("var d = {'a': 1}\nnew d()");
    assert_eq!(run.error().details(), "Keyword 'new' requires a prototype object");

    let run = exec("{'__cls__': 3, '__init__': 1}");
    assert_eq!(run.error().kind(), ErrorKind::Type);
}

#[test]
fn missing_attributes() {
    let run = exec("var d = {'a': 1}\nd.b");
    assert_eq!(run.error().kind(), ErrorKind::Attribute);
    assert_eq!(run.error().details(), "Dictionary has no attribute `b`");

    let run = exec("var P = {'__cls__': 'P', '__init__': function(self) -> 0}\nvar p = new P()\np.nope");
    assert_eq!(run.error().details(), "Object 'P' has no attribute `nope`");
}

#[test]
fn strings_index_code_points() {
    assert_eq!(last_value("len('héllo')"), Value::int(5));
    assert_eq!(last_value("'héllo'[1]"), Value::string("é"));
    assert_eq!(last_value("'日本語'[2]"), Value::string("語"));

    let run = exec("'héllo'[5]");
    assert_eq!(
        run.error().details(),
        "String index out of range (maximum is 4 but got 5)"
    );
}

#[test]
fn variadic_parameters_and_packs() {
    assert_eq!(last_value("function f(a, _rest_) -> rest\nf(1, 2, 3)"), list(&[2, 3]));
    assert_eq!(last_value("function f(a, _rest_) -> rest\nf(1)"), list(&[]));
    assert_eq!(
        last_value("function f(_all_) -> all\nf(1, pack([2, 3]), 4)"),
        list(&[1, 2, 3, 4])
    );

    let run = exec("function f(_a_, _b_) -> 0\nf()");
    assert_eq!(run.error().details(), "Too many mutable arguments");

    let run = exec("function f(_a_, b) -> 0\nf(1)");
    assert_eq!(
        run.error().details(),
        "Mutable argument appeared before positional arguments"
    );
}

#[test]
fn optional_parameters() {
    let source = "function pick(a, __b__) -> __b__\n";
    assert_eq!(last_value(&format!("{}pick(1, 2)", source)), Value::int(2));

    // Left unbound when the argument is missing
    let run = exec(&format!("{}pick(1)", source));
    assert_eq!(run.error().details(), "'__b__' is not defined");

    let run = exec("function f(__x__) -> 1\nf(1, 2)");
    assert_eq!(
        run.error().details(),
        "Too many arguments given to function 'f' (Expected 1 but got 2)"
    );
}

#[test]
fn arity_errors() {
    let run = exec("function add(a, b) -> a + b\nadd(1, 2, 3)");
    assert_eq!(run.error().kind(), ErrorKind::Type);
    assert_eq!(
        run.error().details(),
        "Too many arguments given to function 'add' (Expected 2 but got 3)"
    );

    let run = exec("function add(a, b) -> a + b\nadd(1)");
    assert_eq!(
        run.error().details(),
        "Too few arguments given to function 'add' (Expected 2 but got 1)"
    );

    let run = exec("function f(a, _rest_) -> a\nf()");
    assert_eq!(
        run.error().details(),
        "Too few arguments given to function 'f' (Expected at least 1 but got 0)"
    );
}

#[test]
fn break_and_continue_outside_loops() {
    let run = exec("break");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(run.error().details(), "'break' outside a loop");

    let run = exec("function f()\n    continue\nend\nfor i = 0 to 3 then f()");
    assert_eq!(run.error().details(), "'continue' outside a loop");
}

#[test]
fn for_loops() {
    assert_eq!(last_value("for i = 0 to 4 then i * 2"), list(&[0, 2, 4, 6]));
    assert_eq!(last_value("for i = 5 to 0 step -2 then i"), list(&[5, 3, 1]));
    assert_eq!(last_value("for c in 'ab' then c + '!'").to_string(), "['a!', 'b!']");

    let run = exec(
        "var total = 0
for i in [1, 2, 3, 4, 5] then
    if i == 2 then continue
    if i == 4 then break
    var total = total + i
end
total",
    );
    assert_eq!(run.values()[1], Value::null());
    assert_eq!(run.last(), Value::int(4));

    let run = exec("for i = 0 to 3 step 0 then i");
    assert_eq!(run.error().kind(), ErrorKind::Value);
    assert_eq!(run.error().details(), "For-loop step cannot be zero");
}

#[test]
fn loop_variable_does_not_outlive_the_loop() {
    let run = exec("for i = 0 to 2 then i\ni");
    assert_eq!(run.error().details(), "'i' is not defined");
}

#[test]
fn while_loops_are_null() {
    let run = exec(
        "var n = 0
while n < 5 then var n = n + 1
n",
    );
    assert_eq!(run.values()[1], Value::null());
    assert_eq!(run.last(), Value::int(5));
}

#[test]
fn iterator_protocol() {
    let run = exec(
        "var Countdown = {
    '__cls__': 'Countdown',
    '__init__': function(self, n)
        self.n = n
    end,
    '__iter__': function(self) -> self,
    '__next__': function(self)
        if self.n == 0 then stopIteration()
        self.n = self.n - 1
        return self.n + 1
    end
}
for x in new Countdown(3) then x",
    );

    assert_eq!(run.last(), list(&[3, 2, 1]));
}

#[test]
fn dictionaries_iterate_keys() {
    assert_eq!(
        last_value("var d = {'a': 1, 'b': 2}\nd['c'] = 3\nfor k in d then d[k]"),
        list(&[1, 2, 3])
    );
}

#[test]
fn builtins_on_values() {
    assert_eq!(last_value("typeof([1])"), Value::string("<type 'List'>"));
    assert_eq!(last_value("str(12) + 'a'"), Value::string("12a"));
    assert_eq!(last_value("parseInt(' 42 ')"), Value::int(42));
    assert_eq!(last_value("isInteger(2) + isFloating(2.5)"), Value::int(2));
    assert_eq!(last_value("sqrt(16)"), Value::float(4.));

    let run = exec("parseInt('4x')");
    assert_eq!(run.error().kind(), ErrorKind::Value);

    let run = exec("sin('a')");
    assert_eq!(
        run.error().details(),
        "Type of argument '_x' mismatched: requires one of Number but got String"
    );
}

#[test]
fn print_renders_values() {
    let run = exec("print('a')\nprint(1.5)\nprintln([1, 'x', {'k': 2}])");
    run.values();
    assert_eq!(run.output, "a1.5[1, 'x', {'k': 2}]\n");
}

#[test]
fn eval_runs_in_the_caller_scope() {
    let run = exec("var a = 2\neval('var b = a * 3; b + 1')\nb");
    assert_eq!(run.last(), Value::int(7));

    let run = exec("eval('1 +')");
    assert_eq!(run.error().kind(), ErrorKind::Syntax);
}

#[test]
fn del_removes_user_names_only() {
    let run = exec("var a = 1\ndel('a')\na");
    assert_eq!(run.error().details(), "'a' is not defined");

    let run = exec("del('print')");
    assert_eq!(run.error().kind(), ErrorKind::Runtime);
    assert_eq!(
        run.error().details(),
        "Attempted to delete non-user defined function: 'print'"
    );

    let run = exec("del('nothing')");
    assert_eq!(run.error().details(), "del('nothing'): not defined");
}

#[test]
fn builtins_are_listed() {
    let names = last_value("builtins()");
    let Value::List(names) = names else {
        panic!("builtins() must give a list");
    };

    let names = names.borrow();
    assert!(names.contains(&Value::string("println")));
    assert!(names.contains(&Value::string("require")));
}

#[test]
fn require_loads_a_module_once() {
    let dir = std::env::temp_dir().join(format!("yan-require-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("mathx.yan"),
        "println('loading')\nfunction double(x) -> x * 2\nvar answer = 42",
    )
    .unwrap();

    let config = Config {
        import_path: dir.clone(),
        ..Config::default()
    };
    let run = run_with(
        config,
        "require('mathx')\nrequire('mathx')\n[double(answer), answer]",
    );

    assert_eq!(run.last(), list(&[84, 42]));
    assert_eq!(run.output, "loading\n");

    let run = exec("require('no_such_module_here')");
    assert_eq!(run.error().kind(), ErrorKind::OS);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn files_are_written_and_read_back() {
    let path = std::env::temp_dir().join(format!("yan-file-{}.txt", std::process::id()));
    let path = path.to_string_lossy().replace('\\', "/");

    let source = format!(
        "writeFile('{0}', 'ab')\nwriteFile('{0}', 'cd', 'wa')\nreadFile('{0}')",
        path
    );
    assert_eq!(last_value(&source), Value::string("abcd"));

    let run = exec(&format!("writeFile('{}', 'x', 'r')", path));
    assert_eq!(run.error().details(), "Invalid file open mode: 'r'");

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn traceback_lists_frames_innermost_first() {
    let run = exec(
        "function inner() -> 1 / 0
function outer()
    return inner()
end
outer()",
    );

    let RunError::Runtime(e) = run.error() else {
        panic!("expected a runtime error");
    };

    let frames: Vec<(String, usize)> = e.trace.iter().map(|(label, pos)| (label.clone(), pos.line)).collect();
    assert_eq!(
        frames,
        vec![
            ("inner".to_string(), 0),
            ("outer".to_string(), 2),
            ("<program>".to_string(), 4),
        ]
    );

    let rendered = e.to_string();
    assert!(rendered.contains("File \"<test>\", line 1"));
    assert!(rendered.contains("Traceback (innermost first):\n  at inner [<test>:1]\n  at outer [<test>:3]"));
}

#[test]
fn syntax_errors_are_reported() {
    let run = exec("x = 5");
    assert_eq!(run.error().kind(), ErrorKind::Syntax);

    let run = exec("'unterminated");
    assert_eq!(run.error().kind(), ErrorKind::Syntax);
}
