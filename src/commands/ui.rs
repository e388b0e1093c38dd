//! The `ui` subcommand. A browsable dashboard over the cache is explicitly
//! out of scope; this exists only so the CLI surface matches what the
//! other subcommands advertise, and fails loudly rather than pretending
//! to serve something that isn't built.

pub fn run() {
    tracing::warn!("a dashboard UI is out of scope for this build; nothing to run");
    println!("the `ui` subcommand has no dashboard in this build");
}
