//! Plain-text rendering of application state.

use lodestone_application::AppSnapshot;
use lodestone_core::files::FileRecord;
use lodestone_core::search::SearchResultSet;

pub fn identity(snapshot: &AppSnapshot) -> String {
    match &snapshot.user {
        Some(user) => format!("{} <{}> (id {})", user.username, user.email, user.id),
        None => "Not signed in".to_string(),
    }
}

pub fn files_table(files: &[FileRecord]) -> String {
    if files.is_empty() {
        return "No files uploaded yet.".to_string();
    }

    let name_width = files
        .iter()
        .map(|f| f.original_filename.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!("{:>6}  {:<name_width$}  {:>12}  STATUS\n", "ID", "NAME", "SIZE");
    for file in files {
        out.push_str(&format!(
            "{:>6}  {:<name_width$}  {:>12}  {}\n",
            file.id,
            file.original_filename,
            file.display_size(),
            file.upload_status,
        ));
    }
    out
}

pub fn search_results(results: &SearchResultSet) -> String {
    if results.is_empty() {
        "No results.".to_string()
    } else {
        results.to_pretty_string()
    }
}

pub fn trim_trailing(text: &str) -> &str {
    text.trim_end_matches('\n')
}
