use criterion::{criterion_group, criterion_main, Criterion};
use deb822::{iter_paragraphs, ParseOptions};

fn sources_fixture() -> String {
    let mut text = String::new();
    for i in 0..500 {
        text.push_str(&format!(
            "Package: pkg{i}\nBinary: pkg{i}, pkg{i}-doc\nVersion: 1.{i}-1\nMaintainer: Jane Doe <jane@example.com>\nBuild-Depends: debhelper-compat (= 13), libfoo-dev (>= 1.{i})\nArchitecture: any\nStandards-Version: 4.6.2\nFormat: 3.0 (quilt)\nFiles:\n 0fd797f4138a9d4fdeb8c30597d46bc9 1003 pkg{i}_1.{i}-1.dsc\n d9523676ae75c4ced299689456f252f4 3860 pkg{i}_1.{i}.orig.tar.gz\nDirectory: pool/main/p/pkg{i}\nPriority: optional\nSection: misc\n\n"
        ));
    }
    text
}

fn parse_paragraphs_benchmark(c: &mut Criterion) {
    let data = sources_fixture();

    c.bench_function("iter_paragraphs", |b| {
        b.iter(|| {
            let count = iter_paragraphs(data.as_bytes(), ParseOptions::new())
                .filter(|p| p.is_ok())
                .count();
            assert_eq!(count, 500);
        });
    });

    c.bench_function("iter_paragraphs_limited", |b| {
        b.iter(|| {
            let options = ParseOptions::new().fields(["Package", "Version"]);
            let count = iter_paragraphs(data.as_bytes(), options)
                .filter(|p| p.is_ok())
                .count();
            assert_eq!(count, 500);
        });
    });
}

criterion_group!(benches, parse_paragraphs_benchmark);
criterion_main!(benches);
