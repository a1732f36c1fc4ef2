use tideline_core::TidelineError;
use tree_sitter::{Parser, Tree};

/// Structural measurements of one parsed source file.
///
/// # Examples
///
/// ```
/// use tideline_syntax::scorer::ComplexityScore;
///
/// let score = ComplexityScore { complexity: 1, function_count: 1, class_count: 0 };
/// assert_eq!(score.complexity, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexityScore {
    /// Cyclomatic complexity: 1 plus one per decision point.
    pub complexity: u32,
    /// Function definitions, including `async def` and methods.
    pub function_count: u32,
    /// Class definitions.
    pub class_count: u32,
}

/// Parse Python source into a syntax tree.
///
/// Returns `Ok(None)` when the parser gives up entirely.
///
/// # Errors
///
/// Returns [`TidelineError::Parse`] if the grammar cannot be loaded.
pub fn parse_python(source: &str) -> Result<Option<Tree>, TidelineError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| TidelineError::Parse(format!("failed to set language: {e}")))?;
    Ok(parser.parse(source, None))
}

/// Score Python source.
///
/// Tree-sitter recovers from syntax errors, so any tree containing error or
/// missing nodes is treated as unparsable and yields `Ok(None)`. The grammar
/// also accepts Python 2 `print` and `exec` statements, which are not valid
/// Python 3 and yield `Ok(None)` as well.
///
/// # Errors
///
/// Returns [`TidelineError::Parse`] if the grammar cannot be loaded.
///
/// # Examples
///
/// ```
/// use tideline_syntax::scorer::score_source;
///
/// let score = score_source("def f(x):\n    if x:\n        return 1\n    return 0\n")
///     .unwrap()
///     .unwrap();
/// assert_eq!(score.complexity, 2);
/// assert_eq!(score.function_count, 1);
///
/// assert!(score_source("def broken(:\n").unwrap().is_none());
/// ```
pub fn score_source(source: &str) -> Result<Option<ComplexityScore>, TidelineError> {
    let Some(tree) = parse_python(source)? else {
        return Ok(None);
    };
    if tree.root_node().has_error() || has_python2_statement(&tree) {
        return Ok(None);
    }
    Ok(Some(score_tree(&tree)))
}

fn has_python2_statement(tree: &Tree) -> bool {
    let mut cursor = tree.walk();
    loop {
        if matches!(cursor.node().kind(), "print_statement" | "exec_statement") {
            return true;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return false;
            }
        }
    }
}

/// Score an already parsed tree.
///
/// Adds one per `if`/`elif`, loop (`for`, `async for`, `while`), and
/// exception handler. Boolean operators are binary nodes in the tree, so a
/// chain of N operands contributes N - 1. Comprehension clauses and
/// conditional expressions are not counted.
pub fn score_tree(tree: &Tree) -> ComplexityScore {
    let mut score = ComplexityScore {
        complexity: 1,
        function_count: 0,
        class_count: 0,
    };

    let mut cursor = tree.walk();
    loop {
        match cursor.node().kind() {
            "if_statement" | "elif_clause" | "for_statement" | "while_statement"
            | "except_clause" | "except_group_clause" | "boolean_operator" => {
                score.complexity += 1;
            }
            "function_definition" => score.function_count += 1,
            "class_definition" => score.class_count += 1,
            _ => {}
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return score;
            }
        }
    }
}
