#![allow(dead_code)]

use originscope_core::{
    CatalogData, Column, DependencyEdge, EngineConfig, LineageEngine, MemoryCatalogSource,
    ObjectRef, RoutineDefinition, RoutineKind, Synonym, Table,
};

/// Builder for in-memory catalog fixtures.
#[derive(Default)]
pub struct CatalogFixture {
    data: CatalogData,
}

impl CatalogFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(self, schema: &str, name: &str) -> Self {
        self.table_with_rows(schema, name, 0)
    }

    pub fn table_with_rows(mut self, schema: &str, name: &str, rows: u64) -> Self {
        self.data.tables.push(Table {
            schema: schema.to_string(),
            name: name.to_string(),
            is_base_table: true,
            row_count_estimate: rows,
        });
        self
    }

    pub fn column(mut self, schema: &str, table: &str, name: &str) -> Self {
        self.data.columns.push(plain_column(schema, table, name));
        self
    }

    pub fn computed_column(mut self, schema: &str, table: &str, name: &str, expr: &str) -> Self {
        let mut column = plain_column(schema, table, name);
        column.computed_expression = Some(expr.to_string());
        self.data.columns.push(column);
        self
    }

    pub fn column_with_default(
        mut self,
        schema: &str,
        table: &str,
        name: &str,
        default: &str,
    ) -> Self {
        let mut column = plain_column(schema, table, name);
        column.default_constraint = Some(default.to_string());
        self.data.columns.push(column);
        self
    }

    pub fn procedure(mut self, schema: &str, name: &str, definition: &str) -> Self {
        self.data.routines.push(RoutineDefinition {
            schema: schema.to_string(),
            name: name.to_string(),
            kind: RoutineKind::Procedure,
            definition: definition.to_string(),
            parent_table: None,
        });
        self
    }

    pub fn trigger(
        mut self,
        schema: &str,
        name: &str,
        on_schema: &str,
        on_table: &str,
        definition: &str,
    ) -> Self {
        self.data.routines.push(RoutineDefinition {
            schema: schema.to_string(),
            name: name.to_string(),
            kind: RoutineKind::Trigger,
            definition: definition.to_string(),
            parent_table: Some(ObjectRef::new(on_schema, on_table)),
        });
        self
    }

    pub fn dependency(
        mut self,
        routine_schema: &str,
        routine_name: &str,
        table_schema: &str,
        table_name: &str,
    ) -> Self {
        self.data.dependency_edges.push(DependencyEdge {
            referencing: ObjectRef::new(routine_schema, routine_name),
            referenced: ObjectRef::new(table_schema, table_name),
        });
        self
    }

    pub fn synonym(mut self, schema: &str, name: &str, base_schema: &str, base_name: &str) -> Self {
        self.data.synonyms.push(Synonym {
            schema: schema.to_string(),
            name: name.to_string(),
            base_schema: base_schema.to_string(),
            base_name: base_name.to_string(),
        });
        self
    }

    pub fn into_data(self) -> CatalogData {
        self.data
    }

    /// A refreshed engine over this catalog.
    pub fn build_engine(self) -> LineageEngine {
        self.build_engine_with_config(EngineConfig::default())
    }

    pub fn build_engine_with_config(self, config: EngineConfig) -> LineageEngine {
        let engine = LineageEngine::with_config(
            Box::new(MemoryCatalogSource::new(self.data)),
            config,
        );
        engine.refresh().expect("fixture refresh should succeed");
        engine
    }
}

fn plain_column(schema: &str, table: &str, name: &str) -> Column {
    Column {
        table_schema: schema.to_string(),
        table_name: table.to_string(),
        name: name.to_string(),
        data_type: "nvarchar".to_string(),
        is_nullable: true,
        default_constraint: None,
        computed_expression: None,
    }
}
