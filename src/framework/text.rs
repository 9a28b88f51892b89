//! Line and column filters for captured command output

fn non_empty(s: &&str) -> bool {
    !s.trim().is_empty()
}

/// Split raw output into its non-blank lines, in order
pub fn lines(output: &str) -> Vec<&str> {
    output.split('\n').filter(non_empty).collect()
}

/// Split a line into space-separated columns, dropping blank tokens
///
/// Only the space character separates columns; tabs and quoted fields
/// must be normalized by the caller.
pub fn columns(line: &str) -> Vec<&str> {
    line.split(' ').filter(non_empty).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_drop_blank_entries() {
        assert_eq!(lines("a\n\nb\n "), vec!["a", "b"]);
    }

    #[test]
    fn test_lines_empty_input() {
        assert!(lines("").is_empty());
        assert!(lines("\n \n\t\n").is_empty());
    }

    #[test]
    fn test_lines_keep_inner_whitespace() {
        assert_eq!(lines("  x y \nz"), vec!["  x y ", "z"]);
    }

    #[test]
    fn test_columns_collapse_repeated_spaces() {
        assert_eq!(columns("a  b   c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_columns_do_not_split_tabs() {
        assert_eq!(columns("a\tb c"), vec!["a\tb", "c"]);
    }

    #[test]
    fn test_columns_of_ps_line() {
        let out = "  PID TTY      STAT   TIME COMMAND\n 4242 ?        Sl     0:00 docker-classic build .\n";
        let rows = lines(out);
        assert_eq!(rows.len(), 2);
        let cols = columns(rows[1]);
        assert_eq!(cols[0], "4242");
        assert_eq!(cols[4], "docker-classic");
    }
}
