//! Splits a document into Markdown chunks, tables and verbatim pipe text.

use tracing::debug;

use crate::table::{Table, detect, has_unescaped_pipe};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Ordinary Markdown, rendered by the document renderer.
    Markdown(String),
    Table(Table),
    /// Pipe-containing lines that did not form a table, kept as written.
    Plain(Vec<String>),
}

struct Fence {
    marker: char,
    len: usize,
}

/// Opening or closing code fence: up to three spaces, then three or more
/// backticks or tildes.
fn fence_of(line: &str) -> Option<Fence> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some(Fence { marker, len })
}

/// Leading indentation in columns, with tabs advancing to the next stop of 4.
fn indent_of(line: &str) -> usize {
    let mut cols = 0;
    for c in line.chars() {
        match c {
            ' ' => cols += 1,
            '\t' => cols += 4 - cols % 4,
            _ => break,
        }
    }
    cols
}

pub fn split_blocks(input: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut markdown = String::new();
    let mut candidate: Vec<&str> = Vec::new();
    let mut fence: Option<Fence> = None;

    for line in input.lines() {
        if let Some(open) = &fence {
            if fence_of(line).is_some_and(|f| f.marker == open.marker && f.len >= open.len) {
                fence = None;
            }
            markdown.push_str(line);
            markdown.push('\n');
            continue;
        }

        // Four columns of indent start an indented code block, not a table.
        let starts_code = candidate.is_empty() && indent_of(line) >= 4;
        if has_unescaped_pipe(line) && !starts_code {
            if candidate.is_empty() {
                flush_markdown(&mut markdown, &mut blocks);
            }
            candidate.push(line);
            continue;
        }

        flush_candidate(&mut candidate, &mut blocks);
        if let Some(open) = fence_of(line) {
            fence = Some(open);
        }
        markdown.push_str(line);
        markdown.push('\n');
    }

    flush_candidate(&mut candidate, &mut blocks);
    flush_markdown(&mut markdown, &mut blocks);

    debug!(blocks = blocks.len(), "split document");
    blocks
}

fn flush_markdown(markdown: &mut String, blocks: &mut Vec<Block>) {
    if markdown.trim().is_empty() {
        markdown.clear();
        return;
    }
    blocks.push(Block::Markdown(std::mem::take(markdown)));
}

fn flush_candidate(candidate: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if candidate.is_empty() {
        return;
    }
    let block = match detect(candidate.as_slice()) {
        Some(table) => Block::Table(table),
        None => Block::Plain(candidate.iter().map(|l| l.to_string()).collect()),
    };
    blocks.push(block);
    candidate.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_markdown_only() {
        let blocks = split_blocks("# Title\n\nSome text.\n");
        assert_eq!(blocks, vec![Block::Markdown("# Title\n\nSome text.\n".into())]);
    }

    #[test]
    fn test_table_between_paragraphs() {
        let md = "Before.\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\nAfter.\n";
        let blocks = split_blocks(md);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], Block::Markdown("Before.\n\n".into()));
        let Block::Table(table) = &blocks[1] else {
            panic!("expected table, got {:?}", blocks[1]);
        };
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(blocks[2], Block::Markdown("\nAfter.\n".into()));
    }

    #[test]
    fn test_pseudo_table_is_plain() {
        let md = "| This looks like a table |\nBut there's no separator line\n| So it shouldn't render as table |\n";
        let blocks = split_blocks(md);
        assert_eq!(
            blocks,
            vec![
                Block::Plain(vec!["| This looks like a table |".into()]),
                Block::Markdown("But there's no separator line\n".into()),
                Block::Plain(vec!["| So it shouldn't render as table |".into()]),
            ]
        );
    }

    #[test]
    fn test_prose_separator_declines_whole_group() {
        let md = "| a | b |\n| not | a separator |\n| c | d |\n";
        let blocks = split_blocks(md);
        assert_eq!(
            blocks,
            vec![Block::Plain(vec![
                "| a | b |".into(),
                "| not | a separator |".into(),
                "| c | d |".into(),
            ])]
        );
    }

    #[test]
    fn test_pipes_inside_code_fence_stay_markdown() {
        let md = "```\n| a | b |\n|---|---|\n```\n";
        assert_eq!(split_blocks(md), vec![Block::Markdown(md.into())]);
    }

    #[test]
    fn test_longer_fence_needs_matching_close() {
        let md = "````\n```\n| a |\n|---|\n````\n";
        assert_eq!(split_blocks(md), vec![Block::Markdown(md.into())]);
    }

    #[test]
    fn test_slightly_indented_table_lines() {
        let md = "  | Col | Desc |\n  |-----|------|\n  | **Foo** | Bar |\n";
        let blocks = split_blocks(md);
        assert!(matches!(&blocks[..], [Block::Table(t)] if t.rows.len() == 1));
    }

    #[test]
    fn test_indented_code_pipes_stay_markdown() {
        let md = "    | Col | Desc |\n    |-----|------|\n";
        assert_eq!(split_blocks(md), vec![Block::Markdown(md.into())]);

        let md = "\t| a | b |\n\t|---|---|\n";
        assert_eq!(split_blocks(md), vec![Block::Markdown(md.into())]);
    }

    #[test]
    fn test_indent_of_expands_tabs() {
        assert_eq!(indent_of("abc"), 0);
        assert_eq!(indent_of("   x"), 3);
        assert_eq!(indent_of("  \tx"), 4);
        assert_eq!(indent_of("\t\tx"), 8);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(split_blocks(""), Vec::<Block>::new());
        assert_eq!(split_blocks("\n\n"), Vec::<Block>::new());
    }
}
