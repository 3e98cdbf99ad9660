//! Command-line rendering, user-facing text and the confirmation prompt.

use std::io::{BufRead, Write};

use crate::error::{AutoRunError, Result};
use crate::image::{
    ImageConfig, OCI_DESCRIPTION_LABEL, OCI_DOCUMENTATION_LABEL, OCI_TITLE_LABEL,
};

/// What to do once the command line is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Print the command line and stop
    PrintOnly,
    /// Ask the user before running
    Prompt,
    /// Run without asking
    Run,
}

/// Print mode wins over everything; otherwise prompt only when some label
/// asked for confirmation and the user did not pre-approve.
pub fn decide(print: bool, confirmation_required: bool, yes: bool) -> Decision {
    if print {
        Decision::PrintOnly
    } else if confirmation_required && !yes {
        Decision::Prompt
    } else {
        Decision::Run
    }
}

/// Equivalent engine command line: `<program> run <fragments> <image> <args>`.
pub fn command_line(program: &str, fragments: &[String], image: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(fragments.len() + args.len() + 3);
    parts.push(program);
    parts.push("run");
    parts.extend(fragments.iter().map(String::as_str));
    parts.push(image);
    parts.extend(args.iter().map(String::as_str));
    parts.join(" ")
}

/// Banner naming the image, followed by its OCI title, description and
/// documentation link when present.
pub fn write_doc_header<W: Write>(out: &mut W, image_name: &str, image: &ImageConfig) -> Result<()> {
    write!(out, "\n\nAuto-running {image_name}\n\n")?;

    match (image.label(OCI_TITLE_LABEL), image.label(OCI_DESCRIPTION_LABEL)) {
        (Some(title), Some(desc)) => writeln!(out, "{title}: {desc}")?,
        (Some(title), None) => writeln!(out, "{title}")?,
        (None, Some(desc)) => writeln!(out, "{desc}")?,
        (None, None) => {}
    }
    if let Some(doc) = image.label(OCI_DOCUMENTATION_LABEL) {
        writeln!(out, "See more at {doc}")?;
    }
    writeln!(out)?;
    Ok(())
}

/// Bulleted list of the options labels generated. Nothing is written when
/// there are none.
pub fn write_run_details<W: Write>(out: &mut W, details: &[String]) -> Result<()> {
    if details.is_empty() {
        return Ok(());
    }
    write!(out, "\nAuto generated options:\n\n")?;
    for detail in details {
        writeln!(out, "  * {detail}")?;
    }
    writeln!(out)?;
    Ok(())
}

/// `running: <cmd>` notice shown when no prompt is needed.
pub fn write_announcement<W: Write>(out: &mut W, command: &str) -> Result<()> {
    writeln!(out, "running: {command}")?;
    writeln!(out)?;
    Ok(())
}

/// Show `command` and wait for one line of approval.
///
/// An empty answer, `y` or `yes` (any case, surrounding blanks ignored)
/// approves. Any other answer is [`AutoRunError::Canceled`]. Input that
/// ends before anything was typed is [`AutoRunError::InputError`].
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, command: &str) -> Result<()> {
    write!(
        out,
        "\nthe following command will be executed:\n    {command}\n\nare you OK to proceed? ([y]/n) "
    )?;
    out.flush()?;

    let mut response = String::new();
    match input.read_line(&mut response) {
        Ok(0) => return Err(AutoRunError::InputError("unexpected end of input".to_string())),
        Ok(_) => {}
        Err(e) => return Err(AutoRunError::InputError(e.to_string())),
    }

    match response.trim().to_lowercase().as_str() {
        "" | "y" | "yes" => {
            writeln!(out)?;
            Ok(())
        }
        other => {
            tracing::debug!(response = other, "Confirmation declined");
            Err(AutoRunError::Canceled)
        }
    }
}
