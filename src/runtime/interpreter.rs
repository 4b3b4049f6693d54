use crate::language::{
    ast::{Expr, Stmt},
    token::{Token, TokenKind},
};
use crate::runtime::{
    callable::Callable,
    environment::Environment,
    error::{AtToken, RuntimeError, RuntimeFault, RuntimeResult},
    native,
    value::Value,
};
use std::io::{self, Write};

/// How a statement finished. `Return` unwinds to the nearest call and is not an error.
pub enum Flow {
    Next,
    Return(Value),
}

/// Tree-walking evaluator. Recursion follows the host stack, so unbounded
/// recursion in a script overflows it rather than faulting.
pub struct Interpreter {
    globals: Environment,
    environment: Environment,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let globals = Environment::new();
        native::install(&globals);
        Self {
            environment: globals.clone(),
            globals,
            out,
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Runs a program. The first fault abandons the remaining statements.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        for stmt in statements {
            self.execute(stmt)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                writeln!(self.out, "{value}")
                    .map_err(RuntimeError::from)
                    .at_token(keyword)?;
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
            }
            Stmt::Block(statements) => {
                let scope = Environment::enclosed(&self.environment);
                return self.execute_block(statements, scope);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Function(decl) => {
                let function = Callable::user(decl.clone(), self.environment.clone());
                self.environment
                    .define(decl.name.lexeme.clone(), Value::Callable(function));
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    /// Runs `statements` in `environment`, then puts the previous scope back
    /// whether the block finished, returned or faulted.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> RuntimeResult<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);
        tracing::trace!(depth = self.environment.depth(), "enter scope");
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Variable(name) => self.environment.get(&name.lexeme).at_token(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .assign(&name.lexeme, value.clone())
                    .at_token(name)?;
                Ok(value)
            }
            Expr::Logical { left, op, right } => {
                let left = self.evaluate(left)?;
                let short_circuit = match op.kind {
                    TokenKind::Or => left.is_truthy(),
                    _ => !left.is_truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Unary { op, expr } => {
                let operand = self.evaluate(expr)?;
                match op.kind {
                    TokenKind::Minus => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeFault::at(op, RuntimeError::OperandMustBeNumber)),
                    },
                    _ => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(op, left, right)
            }
            Expr::Call {
                callee,
                paren,
                args,
            } => {
                let callee = self.evaluate(callee)?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.evaluate(arg)?);
                }
                let Value::Callable(callable) = callee else {
                    return Err(RuntimeFault::at(paren, RuntimeError::NotCallable));
                };
                if arguments.len() != callable.arity() {
                    return Err(RuntimeFault::at(
                        paren,
                        RuntimeError::ArityMismatch {
                            expected: callable.arity(),
                            received: arguments.len(),
                        },
                    ));
                }
                tracing::trace!(function = callable.name(), line = paren.line, "call");
                callable.call(self, arguments)
            }
        }
    }
}

fn binary(op: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
    let value = match op.kind {
        TokenKind::Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::String(a), Value::String(b)) => Value::String(a + &b),
            _ => {
                return Err(RuntimeFault::at(
                    op,
                    RuntimeError::OperandsMustBeNumbersOrStrings,
                ))
            }
        },
        TokenKind::EqualEqual => Value::Bool(left == right),
        TokenKind::BangEqual => Value::Bool(left != right),
        _ => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(RuntimeFault::at(op, RuntimeError::OperandMustBeNumber));
            };
            let (a, b) = (*a, *b);
            match op.kind {
                TokenKind::Minus => Value::Number(a - b),
                TokenKind::Star => Value::Number(a * b),
                TokenKind::Slash => Value::Number(a / b),
                TokenKind::Greater => Value::Bool(a > b),
                TokenKind::GreaterEqual => Value::Bool(a >= b),
                TokenKind::Less => Value::Bool(a < b),
                TokenKind::LessEqual => Value::Bool(a <= b),
                _ => return Err(RuntimeFault::at(op, RuntimeError::OperandMustBeNumber)),
            }
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{parser::parse_source, span::Span};
    use crate::tests::SharedBuffer;

    fn run(source: &str) -> (String, RuntimeResult<()>) {
        let parsed = parse_source(source);
        assert!(parsed.errors.is_empty(), "errors: {:?}", parsed.errors);
        let out = SharedBuffer::default();
        let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
        let result = interpreter.interpret(&parsed.statements);
        (out.text(), result)
    }

    fn output(source: &str) -> String {
        let (text, result) = run(source);
        if let Err(fault) = result {
            panic!("unexpected fault: {fault}");
        }
        text
    }

    fn fault(source: &str) -> RuntimeFault {
        match run(source).1 {
            Err(fault) => fault,
            Ok(()) => panic!("expected a runtime fault"),
        }
    }

    #[test]
    fn arithmetic_follows_ieee_doubles() {
        assert_eq!(output("print 1 + 2 * 3;"), "7\n");
        assert_eq!(output("print 7 / 2;"), "3.5\n");
        assert_eq!(output("print 1 / 0;"), "inf\n");
        assert_eq!(output("print -1 / 0;"), "-inf\n");
        assert_eq!(output("print -(2 - 5);"), "3\n");
    }

    #[test]
    fn plus_concatenates_strings() {
        assert_eq!(output("print \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn plus_rejects_mixed_operands() {
        let fault = fault("print 1 + \"b\";");
        assert!(matches!(
            fault.error,
            RuntimeError::OperandsMustBeNumbersOrStrings
        ));
        assert_eq!(fault.line, 1);
    }

    #[test]
    fn arithmetic_and_comparison_need_numbers() {
        for source in ["\"a\" - 1;", "nil * 2;", "true / 1;", "1 < \"2\";", "-\"x\";"] {
            assert!(matches!(
                fault(source).error,
                RuntimeError::OperandMustBeNumber
            ));
        }
    }

    #[test]
    fn truthiness_of_negation() {
        assert_eq!(output("print !nil; print !0; print !\"\";"), "true\nfalse\nfalse\n");
    }

    #[test]
    fn equality_never_crosses_types() {
        assert_eq!(
            output("print 1 == \"1\"; print nil == nil; print nil != false;"),
            "false\ntrue\ntrue\n"
        );
    }

    #[test]
    fn logical_operators_short_circuit_and_return_operands() {
        assert_eq!(output("print nil or \"yes\"; print 0 and 2;"), "yes\n2\n");
        assert_eq!(
            output("var hit = false; fun touch() { hit = true; return true; } false and touch(); true or touch(); print hit;"),
            "false\n"
        );
    }

    #[test]
    fn block_scopes_shadow_and_end() {
        assert_eq!(
            output("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
        let fault = fault("{ var inner = 1; } print inner;");
        assert!(matches!(
            fault.error,
            RuntimeError::UndefinedVariable { ref name } if name == "inner"
        ));
    }

    #[test]
    fn nested_assignment_updates_the_enclosing_binding() {
        assert_eq!(output("var a = 1; { { a = 5; } } print a;"), "5\n");
    }

    #[test]
    fn assigning_an_undeclared_name_faults() {
        assert!(matches!(
            fault("ghost = 1;").error,
            RuntimeError::UndefinedVariable { .. }
        ));
    }

    #[test]
    fn assignment_is_an_expression() {
        assert_eq!(output("var a; var b; a = b = 3; print a + b;"), "6\n");
    }

    #[test]
    fn while_and_for_loops() {
        assert_eq!(
            output("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
        assert_eq!(output("for (var i = 0; i < 2; i = i + 1) print i;"), "0\n1\n");
    }

    #[test]
    fn functions_return_values_and_default_to_nil() {
        assert_eq!(
            output("fun add(a, b) { return a + b; } print add(2, 3);"),
            "5\n"
        );
        assert_eq!(output("fun noop() {} print noop();"), "nil\n");
    }

    #[test]
    fn recursion_computes_fibonacci() {
        assert_eq!(
            output("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(15);"),
            "610\n"
        );
    }

    #[test]
    fn return_unwinds_from_nested_loops_and_branches() {
        let source = "
            fun find() {
                for (var i = 0; i < 10; i = i + 1) {
                    var j = 0;
                    while (j < 10) {
                        if (i == 3) { if (j == 2) { { return i * 10 + j; } } }
                        j = j + 1;
                    }
                }
                return -1;
            }
            print find();
        ";
        assert_eq!(output(source), "32\n");
    }

    #[test]
    fn closures_observe_later_mutation() {
        let source = "
            fun makeCounter() {
                var count = 0;
                fun increment() { count = count + 1; return count; }
                return increment;
            }
            var counter = makeCounter();
            print counter();
            print counter();
            var other = makeCounter();
            print other();
            print counter();
        ";
        assert_eq!(output(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn closure_sees_later_definitions_in_its_declaring_scope() {
        let source = "
            var a = \"global\";
            {
                fun show() { print a; }
                show();
                var a = \"block\";
                show();
            }
        ";
        assert_eq!(output(source), "global\nblock\n");
    }

    #[test]
    fn scope_is_restored_after_a_return_and_after_a_fault() {
        let parsed = parse_source("fun f() { var local = 1; return local; } f();");
        let mut interpreter = Interpreter::with_output(Box::new(SharedBuffer::default()));
        assert!(interpreter.interpret(&parsed.statements).is_ok());
        assert!(interpreter.environment.ptr_eq(interpreter.globals()));

        let parsed = parse_source("{ var local = 1; local + nil; }");
        assert!(interpreter.interpret(&parsed.statements).is_err());
        assert!(interpreter.environment.ptr_eq(interpreter.globals()));
    }

    #[test]
    fn calling_a_non_function_faults() {
        let fault = fault("\"text\"();");
        assert!(matches!(fault.error, RuntimeError::NotCallable));
    }

    #[test]
    fn arity_is_checked_exactly() {
        let fault = fault("fun one(a) {} one(1, 2);");
        assert!(matches!(
            fault.error,
            RuntimeError::ArityMismatch {
                expected: 1,
                received: 2
            }
        ));
        assert_eq!(
            fault.to_string(),
            "Expected 1 arguments but got 2.\n[line 1]"
        );
    }

    #[test]
    fn fault_stops_the_remaining_statements() {
        let (text, result) = run("print 1;\nprint nil + 1;\nprint 3;");
        assert_eq!(text, "1\n");
        assert_eq!(result.err().map(|fault| fault.line), Some(2));
    }

    #[test]
    fn chained_comparison_faults_on_boolean_operand() {
        assert!(matches!(
            fault("print 1 < 2 < 3;").error,
            RuntimeError::OperandMustBeNumber
        ));
    }

    #[test]
    fn functions_print_as_placeholders() {
        assert_eq!(
            output("fun f() {} print f; print clock;"),
            "<fn f>\n<native fn clock>\n"
        );
    }

    #[test]
    fn function_values_compare_by_identity() {
        assert_eq!(
            output("fun f() {} var g = f; print f == g; fun h() {} print f == h;"),
            "true\nfalse\n"
        );
    }

    #[test]
    fn non_arithmetic_operator_in_a_binary_node_faults() {
        let op = Token::new(TokenKind::Comma, ",", 4, Span::new(0, 1));
        let fault = match binary(&op, Value::Number(1.0), Value::Number(2.0)) {
            Err(fault) => fault,
            Ok(value) => panic!("expected a fault, got {value:?}"),
        };
        assert!(matches!(fault.error, RuntimeError::OperandMustBeNumber));
        assert_eq!(fault.line, 4);
    }
}
