/// Separator placed between entries inside one chunk
pub const ENTRY_SEPARATOR: &str = "\n\n";

/// Pack entries greedily into chunks of at most `max_chars` characters.
///
/// Entries are never split. An entry longer than `max_chars` on its own becomes
/// a single oversized chunk. Blank entries are dropped.
pub fn chunk_entries<S: AsRef<str>>(entries: &[S], max_chars: usize) -> Vec<String> {
    let sep_len = ENTRY_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for entry in entries {
        let entry = entry.as_ref().trim();
        if entry.is_empty() {
            continue;
        }
        let entry_len = entry.chars().count();

        if current_len > 0 && current_len + sep_len + entry_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push_str(ENTRY_SEPARATOR);
            current_len += sep_len;
        }
        current.push_str(entry);
        current_len += entry_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}
