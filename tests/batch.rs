//! End-to-end batch tests exercising discovery, the rule engine, and the
//! concurrent driver through the public library API.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use nzb_cleaner::pipeline::{run_batch, FileTask, TransformResult};
use nzb_cleaner::transform::TransformOptions;
use nzb_cleaner::{discovery, nzb};

fn nzb_with(meta: &[(&str, &str)]) -> String {
    let mut head = String::new();
    for (key, value) in meta {
        head.push_str(&format!("    <meta type=\"{key}\">{value}</meta>\n"));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <nzb xmlns=\"http://www.newzbin.com/DTD/2003/nzb\">\n  <head>\n{head}  </head>\n\
           <file poster=\"p@example.com\" date=\"1700000000\" subject=\"s (1/1)\">\n\
             <groups><group>alt.binaries.test</group></groups>\n\
             <segments><segment bytes=\"128\" number=\"1\">id@example.com</segment></segments>\n\
           </file>\n\
         </nzb>\n"
    )
}

fn tasks(dir: &Path, names: &[&str], dest: &Path, options: TransformOptions) -> Vec<FileTask> {
    let options = Arc::new(options);
    names
        .iter()
        .map(|name| FileTask {
            filename: name.to_string(),
            source_dir: dir.to_path_buf(),
            dest_dir: dest.to_path_buf(),
            options: Arc::clone(&options),
        })
        .collect()
}

#[tokio::test]
async fn discovered_directory_batch_produces_one_output_per_input() {
    let source = tempfile::tempdir().expect("tempdir");
    let dest = tempfile::tempdir().expect("tempdir");

    for name in ["one.nzb", "two.nzb", "three{{pw}}.nzb"] {
        fs::write(source.path().join(name), nzb_with(&[("title", "T")])).expect("write");
    }
    fs::write(source.path().join("ignored.txt"), "not nzb").expect("write");

    let (filenames, source_dir) = discovery::discover(source.path()).expect("discover");
    assert_eq!(filenames.len(), 3);

    let options = TransformOptions {
        add_pw_to_meta: true,
        ..TransformOptions::default()
    };
    let batch = tasks(&source_dir, &["one.nzb", "two.nzb", "three{{pw}}.nzb"], dest.path(), options);
    let (summary, results) = run_batch(batch).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.written, 3);
    assert_eq!(summary.failed, 0);
    assert!(results
        .iter()
        .all(|result| matches!(result, TransformResult::Written(_))));

    // The filename-derived password landed in metadata and stayed in the name.
    let cleaned = fs::read_to_string(dest.path().join("three{{pw}}.nzb")).expect("read");
    let doc = nzb::parse(&cleaned).expect("parse");
    assert_eq!(doc.meta_value("password"), Some("pw"));

    // Inputs without a password are untouched on that axis.
    let plain = fs::read_to_string(dest.path().join("one.nzb")).expect("read");
    let doc = nzb::parse(&plain).expect("parse");
    assert_eq!(doc.meta_value("password"), None);
}

#[tokio::test]
async fn corrupted_file_among_valid_ones_is_isolated() {
    let dir = tempfile::tempdir().expect("tempdir");
    for name in ["a.nzb", "b.nzb", "c.nzb", "d.nzb"] {
        fs::write(dir.path().join(name), nzb_with(&[("title", "T")])).expect("write");
    }
    fs::write(dir.path().join("broken.nzb"), "<<<garbage>>>").expect("write");

    let options = TransformOptions {
        remove_title_from_meta: true,
        ..TransformOptions::default()
    };
    let dest = tempfile::tempdir().expect("tempdir");
    let batch = tasks(
        dir.path(),
        &["a.nzb", "b.nzb", "c.nzb", "d.nzb", "broken.nzb"],
        dest.path(),
        options,
    );
    let (summary, results) = run_batch(batch).await;

    assert_eq!(summary.total, 5);
    assert_eq!(summary.written, 4);
    assert_eq!(summary.failed, 1);
    assert!(!dest.path().join("broken.nzb").exists());

    let failed_names: Vec<_> = results
        .iter()
        .filter_map(|result| match result {
            TransformResult::Failed { filename, .. } => Some(filename.as_str()),
            TransformResult::Written(_) => None,
        })
        .collect();
    assert_eq!(failed_names, vec!["broken.nzb"]);

    // Sibling outputs had the rule applied.
    let doc = nzb::parse(&fs::read_to_string(dest.path().join("a.nzb")).expect("read"))
        .expect("parse");
    assert_eq!(doc.meta_value("title"), None);
}

#[tokio::test]
async fn password_moves_from_filename_to_metadata_and_back_off_the_name() {
    // report{{secret}}.nzb --apm --rpf: password preserved in metadata,
    // stripped from the filename.
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("report{{secret}}.nzb"), nzb_with(&[])).expect("write");

    let options = TransformOptions {
        add_pw_to_meta: true,
        remove_pw_from_filename: true,
        ..TransformOptions::default()
    };
    let batch = tasks(dir.path(), &["report{{secret}}.nzb"], dir.path(), options);
    let (summary, _) = run_batch(batch).await;

    assert_eq!(summary.written, 1);
    let output = dir.path().join("report.nzb");
    assert!(output.exists());
    let doc = nzb::parse(&fs::read_to_string(output).expect("read")).expect("parse");
    assert_eq!(doc.meta_value("password"), Some("secret"));
}

#[tokio::test]
async fn invalid_metadata_password_keeps_filename_derived_value() {
    // x{{pa/ss}}.nzb --apm --apf: the slash is fine in metadata but fails
    // filename validation, so the original filename-derived value stays.
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("x{{pa-ss}}.nzb"), nzb_with(&[("password", "in/valid")]))
        .expect("write");

    let options = TransformOptions {
        add_pw_to_filename: true,
        ..TransformOptions::default()
    };
    let batch = tasks(dir.path(), &["x{{pa-ss}}.nzb"], dir.path(), options);
    let (summary, _) = run_batch(batch).await;

    assert_eq!(summary.written, 1);
    // Output keeps the filename-derived password, not the invalid one.
    assert!(dir.path().join("x{{pa-ss}}.nzb").exists());
    assert!(!dir.path().join("x{{in/valid}}.nzb").exists());
}

#[tokio::test]
async fn cdata_password_survives_in_place_rewrite() {
    // A password stored as a CDATA section is ordinary character data and
    // must survive a rewrite that only touches the title.
    let dir = tempfile::tempdir().expect("tempdir");
    let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                 <nzb xmlns=\"http://www.newzbin.com/DTD/2003/nzb\">\n\
                 <head>\n\
                 <meta type=\"title\">Movie</meta>\n\
                 <meta type=\"password\"><![CDATA[secret]]></meta>\n\
                 </head>\n\
                 </nzb>\n";
    fs::write(dir.path().join("movie.nzb"), input).expect("write");

    let options = TransformOptions {
        remove_title_from_meta: true,
        ..TransformOptions::default()
    };
    let batch = tasks(dir.path(), &["movie.nzb"], dir.path(), options);
    let (summary, _) = run_batch(batch).await;
    assert_eq!(summary.written, 1);

    let doc = nzb::parse(&fs::read_to_string(dir.path().join("movie.nzb")).expect("read"))
        .expect("rewritten file parses");
    assert_eq!(doc.meta_value("password"), Some("secret"));
    assert_eq!(doc.meta_value("title"), None);
}

#[tokio::test]
async fn self_closing_file_entries_survive_rewrite() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = "<nzb><head><meta type=\"title\">T</meta></head>\
                 <file poster=\"p@example.com\" date=\"1700000000\" subject=\"s (1/1)\"/></nzb>";
    fs::write(dir.path().join("solo.nzb"), input).expect("write");

    let options = TransformOptions {
        remove_title_from_meta: true,
        ..TransformOptions::default()
    };
    let batch = tasks(dir.path(), &["solo.nzb"], dir.path(), options);
    let (summary, _) = run_batch(batch).await;
    assert_eq!(summary.written, 1);

    let doc = nzb::parse(&fs::read_to_string(dir.path().join("solo.nzb")).expect("read"))
        .expect("rewritten file parses");
    assert_eq!(doc.files().len(), 1);
    assert_eq!(doc.files()[0].subject, "s (1/1)");
}

#[tokio::test]
async fn title_rename_uses_metadata_title() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("movie.nzb"), nzb_with(&[("title", "Movie Title")]))
        .expect("write");

    let options = TransformOptions {
        use_title_for_filename: true,
        ..TransformOptions::default()
    };
    let batch = tasks(dir.path(), &["movie.nzb"], dir.path(), options);
    let (summary, results) = run_batch(batch).await;

    assert_eq!(summary.written, 1);
    let written = match &results[0] {
        TransformResult::Written(path) => path.clone(),
        TransformResult::Failed { error, .. } => panic!("unexpected failure: {error}"),
    };
    assert_eq!(written, dir.path().join("Movie Title.nzb"));
    assert!(written.exists());
}
