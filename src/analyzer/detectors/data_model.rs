//! Data model detector.
//!
//! Recognizes Prisma models, TypeScript interfaces/types in model files,
//! Mongoose schemas, SQLAlchemy/Django/SQLModel classes, TypeORM entities
//! and GraphQL object types.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::{Detection, compile_one};
use crate::types::{DataModel, ModelField};

struct Patterns {
    prisma_model: Option<Regex>,
    prisma_field: Option<Regex>,
    ts_interface: Option<Regex>,
    ts_type: Option<Regex>,
    ts_field: Option<Regex>,
    mongoose_model: Option<Regex>,
    mongoose_schema: Option<Regex>,
    python_class: Option<Regex>,
    python_field: Option<Regex>,
    typeorm_entity: Option<Regex>,
    typeorm_column: Option<Regex>,
    graphql_type: Option<Regex>,
    graphql_field: Option<Regex>,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    prisma_model: compile_one(r"(?m)^\s*model\s+(\w+)\s*\{([^}]*)\}"),
    prisma_field: compile_one(r"(?m)^\s*(\w+)\s+(\w+)(\[\])?(\?)?"),
    ts_interface: compile_one(r"(?:export\s+)?interface\s+(\w+)(?:\s+extends\s+[^{]+)?\s*\{([^}]*)\}"),
    ts_type: compile_one(r"(?:export\s+)?type\s+(\w+)\s*=\s*\{([^}]*)\}"),
    ts_field: compile_one(r"(?m)^\s*(?:readonly\s+)?(\w+)(\?)?\s*:\s*([^;,\n]+)"),
    mongoose_model: compile_one(r#"(?:mongoose\.)?model\s*(?:<[^>]*>)?\(\s*['"](\w+)['"]"#),
    mongoose_schema: compile_one(r"new\s+(?:mongoose\.)?Schema\s*(?:<[^>]*>)?\(\s*\{"),
    python_class: compile_one(
        r"(?m)^class\s+(\w+)\s*\(\s*([\w.]*(?:Model|Base|DeclarativeBase|SQLModel)[\w.]*)[^)]*\)\s*:",
    ),
    python_field: compile_one(
        r"^\s+(\w+)\s*(?::\s*[^=]+)?=\s*(?:db\.|sa\.|models\.)?(Column|mapped_column|Field|\w+Field)\s*\((.*)$",
    ),
    typeorm_entity: compile_one(r"@Entity\([^)]*\)\s*(?:export\s+)?class\s+(\w+)"),
    typeorm_column: compile_one(
        r"@(?:Column|PrimaryGeneratedColumn|PrimaryColumn|CreateDateColumn|UpdateDateColumn)\([^)]*\)\s*(\w+)(\?|!)?\s*:\s*([\w\[\]<>|. ]+)",
    ),
    graphql_type: compile_one(r"\btype\s+(\w+)\s*(?:implements\s+[^{]+)?\{([^}]*)\}"),
    graphql_field: compile_one(r"(?m)^\s*(\w+)(?:\([^)]*\))?\s*:\s*([\w\[\]!]+)"),
});

const PRISMA_SKIP_PREFIXES: &[&str] = &["@@", "//"];
const GRAPHQL_ROOT_TYPES: &[&str] = &["Query", "Mutation", "Subscription"];

pub fn detect(content: &str, path: &str) -> Detection<DataModel> {
    let mut detection = Detection::default();

    if path.ends_with(".prisma") {
        detect_prisma(content, path, &mut detection);
    } else if path.ends_with(".graphql") || path.ends_with(".gql") {
        detect_graphql(content, path, &mut detection);
    } else if path.ends_with(".py") {
        detect_python(content, path, &mut detection);
    } else {
        detect_typeorm(content, path, &mut detection);
        detect_mongoose(content, path, &mut detection);
        detect_typescript(content, path, &mut detection);
    }

    // First definition of a name wins
    let mut seen = HashSet::new();
    detection.facts.retain(|m| seen.insert(m.name.clone()));
    detection
}

fn model(name: &str, fields: Vec<ModelField>, path: &str, kind: &str) -> DataModel {
    DataModel {
        name: name.to_string(),
        fields,
        source: path.to_string(),
        kind: kind.to_string(),
    }
}

fn field(name: &str, field_type: &str, optional: bool) -> ModelField {
    ModelField {
        name: name.to_string(),
        field_type: field_type.trim().to_string(),
        optional,
    }
}

fn detect_prisma(content: &str, path: &str, detection: &mut Detection<DataModel>) {
    let (Some(model_re), Some(field_re)) = (&PATTERNS.prisma_model, &PATTERNS.prisma_field) else {
        return;
    };
    for caps in model_re.captures_iter(content) {
        let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let fields = body
            .as_str()
            .lines()
            .filter(|line| !PRISMA_SKIP_PREFIXES.iter().any(|p| line.trim_start().starts_with(p)))
            .filter_map(|line| field_re.captures(line))
            .filter_map(|c| {
                let name = c.get(1)?.as_str();
                let ty = c.get(2)?.as_str();
                let ty = if c.get(3).is_some() { format!("{}[]", ty) } else { ty.to_string() };
                Some(field(name, &ty, c.get(4).is_some()))
            })
            .collect();
        detection.tag("prisma");
        detection.facts.push(model(name.as_str(), fields, path, "prisma"));
    }
}

fn detect_typescript(content: &str, path: &str, detection: &mut Detection<DataModel>) {
    let Some(field_re) = &PATTERNS.ts_field else {
        return;
    };
    for re in [&PATTERNS.ts_interface, &PATTERNS.ts_type].into_iter().flatten() {
        for caps in re.captures_iter(content) {
            let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let fields = field_re
                .captures_iter(body.as_str())
                .filter_map(|c| {
                    Some(field(
                        c.get(1)?.as_str(),
                        c.get(3)?.as_str(),
                        c.get(2).is_some(),
                    ))
                })
                .collect();
            detection.facts.push(model(name.as_str(), fields, path, "typescript"));
        }
    }
}

fn detect_mongoose(content: &str, path: &str, detection: &mut Detection<DataModel>) {
    let has_schema = PATTERNS
        .mongoose_schema
        .as_ref()
        .is_some_and(|re| re.is_match(content));
    if !has_schema {
        return;
    }
    let Some(re) = &PATTERNS.mongoose_model else {
        return;
    };
    for caps in re.captures_iter(content) {
        if let Some(name) = caps.get(1) {
            detection.tag("mongoose");
            detection.facts.push(model(name.as_str(), Vec::new(), path, "mongoose"));
        }
    }
}

fn detect_typeorm(content: &str, path: &str, detection: &mut Detection<DataModel>) {
    let (Some(entity_re), Some(column_re)) = (&PATTERNS.typeorm_entity, &PATTERNS.typeorm_column)
    else {
        return;
    };
    let entities: Vec<_> = entity_re.captures_iter(content).collect();
    for (i, caps) in entities.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = entities
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let fields = column_re
            .captures_iter(&content[whole.end()..end])
            .filter_map(|c| {
                Some(field(
                    c.get(1)?.as_str(),
                    c.get(3)?.as_str(),
                    c.get(2).is_some_and(|m| m.as_str() == "?"),
                ))
            })
            .collect();
        detection.tag("typeorm");
        detection.facts.push(model(name.as_str(), fields, path, "typeorm"));
    }
}

fn detect_python(content: &str, path: &str, detection: &mut Detection<DataModel>) {
    let (Some(class_re), Some(field_re)) = (&PATTERNS.python_class, &PATTERNS.python_field) else {
        return;
    };
    for caps in class_re.captures_iter(content) {
        let (Some(whole), Some(name), Some(base)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let kind = match base.as_str() {
            "models.Model" => "django",
            "SQLModel" => "sqlmodel",
            _ => "sqlalchemy",
        };

        // Class body: indented lines up to the next top-level statement
        let fields = content[whole.end()..]
            .lines()
            .skip(1)
            .take_while(|line| line.trim().is_empty() || line.starts_with(char::is_whitespace))
            .filter_map(|line| field_re.captures(line))
            .filter_map(|c| {
                let name = c.get(1)?.as_str();
                let ctor = c.get(2)?.as_str();
                let args = c.get(3).map_or("", |m| m.as_str());
                let ty = args
                    .split(',')
                    .next()
                    .map(str::trim)
                    .filter(|t| !t.is_empty() && !t.contains('='))
                    .unwrap_or(ctor);
                let optional = args.contains("nullable=True") || args.contains("null=True");
                Some(field(name, ty, optional))
            })
            .collect();

        detection.tag(kind);
        detection.facts.push(model(name.as_str(), fields, path, kind));
    }
}

fn detect_graphql(content: &str, path: &str, detection: &mut Detection<DataModel>) {
    let (Some(type_re), Some(field_re)) = (&PATTERNS.graphql_type, &PATTERNS.graphql_field) else {
        return;
    };
    for caps in type_re.captures_iter(content) {
        let (Some(name), Some(body)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if GRAPHQL_ROOT_TYPES.contains(&name.as_str()) {
            continue;
        }
        let fields = field_re
            .captures_iter(body.as_str())
            .filter_map(|c| {
                let ty = c.get(2)?.as_str();
                Some(field(c.get(1)?.as_str(), ty, !ty.ends_with('!')))
            })
            .collect();
        detection.tag("graphql");
        detection.facts.push(model(name.as_str(), fields, path, "graphql"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prisma_models() {
        let content = r#"
model User {
  id    Int     @id @default(autoincrement())
  email String  @unique
  name  String?
  posts Post[]
  @@index([email])
}
"#;
        let d = detect(content, "prisma/schema.prisma");
        assert_eq!(d.facts.len(), 1);
        let user = &d.facts[0];
        assert_eq!(user.name, "User");
        let names: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email", "name", "posts"]);
        assert!(user.fields[2].optional);
        assert_eq!(user.fields[3].field_type, "Post[]");
        assert_eq!(d.framework.as_deref(), Some("prisma"));
    }

    #[test]
    fn test_typescript_interface() {
        let content = "export interface Order {\n  id: string;\n  total: number;\n  note?: string;\n}";
        let d = detect(content, "src/models/order.ts");
        assert_eq!(d.facts[0].name, "Order");
        assert_eq!(d.facts[0].kind, "typescript");
        assert_eq!(d.facts[0].fields.len(), 3);
        assert!(d.facts[0].fields[2].optional);
        assert_eq!(d.framework, None);
    }

    #[test]
    fn test_sqlalchemy_and_django() {
        let content = r#"
class Invoice(db.Model):
    id = db.Column(db.Integer, primary_key=True)
    memo = db.Column(db.String(120), nullable=True)

class Customer(models.Model):
    name = models.CharField(max_length=80)
"#;
        let d = detect(content, "app/models.py");
        assert_eq!(d.facts.len(), 2);
        assert_eq!(d.facts[0].kind, "sqlalchemy");
        assert_eq!(d.facts[0].fields[0].field_type, "db.Integer");
        assert!(d.facts[0].fields[1].optional);
        assert_eq!(d.facts[1].kind, "django");
        assert_eq!(d.facts[1].fields[0].field_type, "CharField");
    }

    #[test]
    fn test_typeorm_entity() {
        let content = r#"
@Entity()
export class Product {
  @PrimaryGeneratedColumn()
  id: number;

  @Column({ nullable: true })
  sku?: string;
}
"#;
        let d = detect(content, "src/product.entity.ts");
        let product = d.facts.iter().find(|m| m.kind == "typeorm").unwrap();
        assert_eq!(product.name, "Product");
        assert_eq!(product.fields.len(), 2);
        assert!(product.fields[1].optional);
    }

    #[test]
    fn test_mongoose_and_graphql() {
        let mongoose = "const s = new mongoose.Schema({ title: String });\nexport default mongoose.model('Article', s);";
        let d = detect(mongoose, "src/models/article.js");
        assert_eq!(d.facts[0].name, "Article");
        assert_eq!(d.framework.as_deref(), Some("mongoose"));

        let gql = "type Query { me: User }\ntype User {\n  id: ID!\n  bio: String\n}";
        let d = detect(gql, "schema.graphql");
        assert_eq!(d.facts.len(), 1);
        assert_eq!(d.facts[0].name, "User");
        assert!(!d.facts[0].fields[0].optional);
        assert!(d.facts[0].fields[1].optional);
    }

    #[test]
    fn test_nothing_matches() {
        assert!(detect("just some text", "src/models/readme.ts").is_empty());
    }
}
