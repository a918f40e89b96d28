use std::borrow::Cow;
use std::io::{BufWriter, Write};

use ptree::print_config::UTF_CHARS;
use ptree::{write_tree_with, PrintConfig, Style, TreeItem};

use crate::memo::{GroupId, Memo};

/// A group viewed as a node of the normalized expression tree.
#[derive(Clone)]
pub struct ExplainNode<'a> {
    memo: &'a Memo,
    group: GroupId,
}

impl<'a> TreeItem for ExplainNode<'a> {
    type Child = Self;

    fn write_self<W: Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(&self.memo[self.group].expr().operator()))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(
            self.memo[self.group]
                .expr()
                .children()
                .iter()
                .map(|c| ExplainNode {
                    memo: self.memo,
                    group: *c,
                })
                .collect::<Vec<_>>(),
        )
    }
}

pub fn explain<W: Write>(memo: &Memo, group: GroupId, output: &mut W) -> std::io::Result<()> {
    let config = PrintConfig {
        indent: 3,
        characters: UTF_CHARS.into(),
        ..Default::default()
    };
    write_tree_with(&ExplainNode { memo, group }, output, &config)
}

pub fn explain_to_string(memo: &Memo, group: GroupId) -> std::io::Result<String> {
    let mut buf = BufWriter::new(Vec::new());
    explain(memo, group, &mut buf)?;

    let bytes = buf.into_inner()?;
    String::from_utf8(bytes)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
