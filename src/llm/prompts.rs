pub const COMMIT_INSTRUCTIONS: &str = r#"You are a helpful assistant that writes only clean, conventional git commit messages.
Rules:
- Respond with just the commit message, nothing else.
- Start with a one-line summary in conventional form, e.g. "fix(parser): handle empty input".
- Keep the summary under 72 characters and write it in the imperative mood
  ("Fix crash", "Add support for ..."), not "Fixed" or "Adds".
- Optionally follow with one blank line and a body of bullet points starting with "- ",
  also in the imperative mood.
- Do not include labels like "Commit message:" or "Here is the message:".
- Do not wrap the message in code fences or quotes.
- Do not include explanations, apologies, or greetings."#;

pub const EXAMPLES_HEADER: &str =
    "Previous commits from this repository, for style reference only:";

pub const DIFF_HEADER: &str = "Write the commit message for the following staged diff.";
