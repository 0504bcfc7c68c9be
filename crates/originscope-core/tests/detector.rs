use originscope_core::{detect_writers, DetectTarget, WriterKind};
use rstest::rstest;

fn salary_target() -> DetectTarget {
    DetectTarget::for_column("Salary").with_table("dbo", "Employees")
}

#[rstest]
#[case::update("UPDATE Employees SET Salary = @x WHERE Id = @y", WriterKind::Update, Some("@x"))]
#[case::update_qualified(
    "UPDATE [dbo].[Employees] SET [Salary] = Base + Bonus",
    WriterKind::Update,
    Some("Base + Bonus")
)]
#[case::update_lowercase_keywords(
    "update employees set salary = 0 where 1 = 1",
    WriterKind::Update,
    Some("0")
)]
#[case::insert_select(
    "INSERT INTO dbo.Employees (Id, Salary) SELECT s.Id, s.Pay FROM staging.Pay s",
    WriterKind::InsertSelect,
    Some("s.Pay")
)]
#[case::insert_values(
    "INSERT INTO Employees (Id, Salary) VALUES (@id, @pay)",
    WriterKind::InsertValues,
    Some("@pay")
)]
#[case::merge_update(
    "MERGE Employees AS t USING staging.Pay AS s ON t.Id = s.Id WHEN MATCHED THEN UPDATE SET Salary = s.Pay;",
    WriterKind::MergeUpdate,
    Some("s.Pay")
)]
#[case::merge_insert(
    "MERGE Employees AS t USING staging.Pay AS s ON t.Id = s.Id WHEN NOT MATCHED THEN INSERT (Id, Salary) VALUES (s.Id, s.Pay);",
    WriterKind::MergeInsert,
    Some("s.Pay")
)]
fn statement_kind_matrix(
    #[case] sql: &str,
    #[case] kind: WriterKind,
    #[case] expression: Option<&str>,
) {
    let found = detect_writers(sql, &salary_target(), 160);
    assert_eq!(found.len(), 1, "expected exactly one writer in: {sql}");
    assert_eq!(found[0].kind, kind);
    assert_eq!(found[0].expression.as_deref(), expression);
}

#[rstest]
#[case::column_only_in_comment("-- Salary\nUPDATE Employees SET Name = @n")]
#[case::column_only_in_string("UPDATE Employees SET Note = 'raise Salary later'")]
#[case::select_only("SELECT Salary FROM Employees")]
#[case::delete_only("DELETE FROM Employees WHERE Salary > 100")]
#[case::different_column("UPDATE Employees SET SalaryHistory = 1")]
fn non_writes_produce_nothing(#[case] sql: &str) {
    let found = detect_writers(sql, &salary_target(), 160);
    assert!(found.is_empty(), "expected no writers in: {sql}");
}

#[test]
fn full_procedure_body_yields_every_writer() {
    let body = r#"
CREATE PROCEDURE dbo.usp_SyncSalaries
    @Cutoff DATE
AS
BEGIN
    SET NOCOUNT ON;

    /* refresh current rows */
    UPDATE e
    SET Salary = p.Pay,
        UpdatedAt = GETDATE()
    FROM dbo.Employees e
    JOIN staging.Pay p ON p.Id = e.Id
    WHERE p.LoadedAt >= @Cutoff;

    -- late arrivals
    INSERT INTO dbo.Employees (Id, Salary)
    SELECT p.Id, p.Pay
    FROM staging.Pay p
    WHERE NOT EXISTS (SELECT 1 FROM dbo.Employees e WHERE e.Id = p.Id);
END
"#;
    let found = detect_writers(body, &salary_target(), 160);
    let kinds: Vec<WriterKind> = found.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![WriterKind::Update, WriterKind::InsertSelect]);
    assert_eq!(found[0].expression.as_deref(), Some("p.Pay"));
    assert_eq!(found[1].expression.as_deref(), Some("p.Pay"));
    assert_eq!(found[1].source_tables, vec!["staging.Pay".to_string()]);
    assert!(found[0].excerpt.contains("SET Salary = p.Pay"));
}

#[test]
fn dynamic_sql_with_names_only_in_literal() {
    let target = DetectTarget::for_column("Salary").with_table("dbo", "T");
    let sql = "DECLARE @cmd NVARCHAR(400);\nSET @cmd = N'UPDATE T SET Salary = 0 WHERE Id = 1';\nEXEC sp_executesql @cmd;";
    let found = detect_writers(sql, &target, 160);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, WriterKind::Dynamic);
    assert!(found[0].expression.is_none());
    assert!(found[0].note.is_some());
}

#[test]
fn detection_is_deterministic() {
    let sql = "UPDATE Employees SET Salary = 1; UPDATE Employees SET Salary = 2;";
    let first = detect_writers(sql, &salary_target(), 160);
    let second = detect_writers(sql, &salary_target(), 160);
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn column_match_ignores_case() {
    let target = DetectTarget::for_column("salary").with_table("dbo", "Employees");
    let found = detect_writers("UPDATE Employees SET SALARY = 1", &target, 160);
    assert_eq!(found.len(), 1);
}
