use crate::expression::Node;
use std::fmt::Write;

fn precedence(node: &Node) -> u8 {
	match node {
		Node::Pattern(_) | Node::Reference(_) => 5,
		Node::Complement(_) => 4,
		Node::Intersection(..) => 3,
		Node::Difference(..) => 2,
		Node::ImpliedUnion(_) => 1,
		Node::Union(_) => 0,
	}
}

/// Canonical text for a tree. Nothing renders as the empty string.
pub(crate) fn render(root: Option<&Node>) -> String {
	let mut out = String::new();
	if let Some(node) = root {
		write_node(&mut out, node);
	}
	out
}

fn write_operand(out: &mut String, node: &Node, parent: u8, is_rhs: bool) {
	let own = precedence(node);
	if own < parent || (own == parent && is_rhs) {
		out.push('(');
		write_node(out, node);
		out.push(')');
	} else {
		write_node(out, node);
	}
}

fn write_list(out: &mut String, children: &[Node], parent: u8, separator: &str) {
	for (i, child) in children.iter().enumerate() {
		if i > 0 {
			out.push_str(separator);
		}
		write_operand(out, child, parent, i > 0);
	}
}

fn write_node(out: &mut String, node: &Node) {
	let own = precedence(node);
	match node {
		Node::Pattern(pattern) => {
			let _ = write!(out, "{}", pattern);
		}
		Node::Reference(reference) => {
			let _ = write!(out, "{}", reference);
		}
		Node::Complement(operand) => {
			out.push('~');
			write_operand(out, operand, own, false);
		}
		Node::ImpliedUnion(children) => write_list(out, children, own, " "),
		Node::Union(children) => write_list(out, children, own, " + "),
		Node::Intersection(lhs, rhs) => {
			write_operand(out, lhs, own, false);
			out.push_str(" & ");
			write_operand(out, rhs, own, true);
		}
		Node::Difference(lhs, rhs) => {
			write_operand(out, lhs, own, false);
			out.push_str(" - ");
			write_operand(out, rhs, own, true);
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::expression::PathExpression;

	#[test]
	fn test_text_round_trips() {
		for text in [
			"/foo//bar",
			"/a /b /c /d/e/f",
			"~/a",
			"~(/a /b)",
			"/a// - /a/b/c",
			"/a - (/b - /c)",
			"/a - /b - /c",
			"/a & ~/b",
			"(/a /b) & /c",
			"/a /b + /c",
			"/a (/b + /c)",
			"/a - /b /c",
			"%_ /b",
			"/a %_ %:foo - %:bar",
			"//World//Foo/Bar// - %/World:geom",
			"/foo*//bar{isPrimPath}",
			"/a//{isPropertyPath} - /a/b.c",
		] {
			let expr = PathExpression::parse(text).unwrap();
			assert_eq!(expr.text(), text);
			assert_eq!(PathExpression::parse(expr.text()).unwrap(), expr);
		}
	}

	#[test]
	fn test_redundant_parentheses_dropped() {
		let expr = PathExpression::parse("((/a)) (/b - /c) ((/d & /e))").unwrap();
		assert_eq!(expr.text(), "/a /b - /c /d & /e");
	}

	#[test]
	fn test_pipe_renders_as_plus() {
		assert_eq!(PathExpression::parse("/a|/b").unwrap().text(), "/a + /b");
	}
}
