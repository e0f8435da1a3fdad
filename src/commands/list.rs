use std::io::Write;

use anyhow::{Context, Result};

use crate::app::App;
use crate::types::Record;

pub fn run(app: &App, limit: Option<usize>) -> Result<()> {
    let posts = app.store.list().context("listing posts")?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_posts(&mut out, &posts, limit)?;
    Ok(())
}

fn write_posts<W: Write>(out: &mut W, posts: &[Record], limit: Option<usize>) -> Result<()> {
    let shown = limit.unwrap_or(posts.len()).min(posts.len());
    for post in &posts[..shown] {
        writeln!(out, "{}\t{}\t{}", post.id, post.user_id, post.title)?;
    }
    if shown < posts.len() {
        writeln!(out, "... {} more", posts.len() - shown)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_posts_respects_limit() {
        let posts = vec![
            Record::new(1, 1, "one", ""),
            Record::new(2, 1, "two", ""),
            Record::new(3, 2, "three", ""),
        ];
        let mut buf = Vec::new();
        write_posts(&mut buf, &posts, Some(2)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1\t1\tone\n2\t1\ttwo\n... 1 more\n");
    }
}
