//! Export a list of users with declared column metadata

use chrono::NaiveDate;
use record_export::accessor::{AccessorTable, Property, Record};
use record_export::metadata::{ExcelField, RecordDescriptor};
use record_export::{AccessError, ExcelExport, ExportMode, Exportable, FormatError, Value};
use std::sync::LazyLock;

struct Department {
    name: String,
}

struct User {
    id: i64,
    name: String,
    email: String,
    active: bool,
    salary: f64,
    joined: NaiveDate,
    department: Option<Department>,
}

static DEPARTMENT: LazyLock<AccessorTable<Department>> = LazyLock::new(|| {
    AccessorTable::<Department>::new("Department").value("name", |d| Value::from(d.name.as_str()))
});

static USER: LazyLock<AccessorTable<User>> = LazyLock::new(|| {
    AccessorTable::<User>::new("User")
        .value("id", |u| Value::from(u.id))
        .value("name", |u| Value::from(u.name.as_str()))
        .value("email", |u| Value::from(u.email.as_str()))
        .value("active", |u| Value::from(u.active))
        .value("salary", |u| Value::from(u.salary))
        .value("joined", |u| Value::from(u.joined))
        .nested("department", |u| u.department.as_ref().map(|d| d as &dyn Record))
});

impl Record for Department {
    fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
        DEPARTMENT.resolve(self, name)
    }
}

impl Record for User {
    fn property(&self, name: &str) -> Result<Property<'_>, AccessError> {
        USER.resolve(self, name)
    }
}

impl Exportable for User {
    fn descriptor() -> RecordDescriptor {
        RecordDescriptor::new("User")
            .field("id", ExcelField::new("ID").sort(10).align_code(2))
            .field("name", ExcelField::new("Name").sort(20).groups([1, 2]))
            .field("email", ExcelField::new("Email**Work address").sort(30).groups([1]))
            .field(
                "department",
                ExcelField::new("Department").sort(40).path("department.name").groups([2]),
            )
            .field("salary", ExcelField::new("Salary").sort(50).align_code(3).groups([2]))
            .field("joined", ExcelField::new("Joined").sort(60))
            .field("active", ExcelField::new("Active").sort(70))
            .field("password", ExcelField::new("Password").mode(ExportMode::Import))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let users = vec![
        User {
            id: 1,
            name: "Alice Johnson".into(),
            email: "alice@example.com".into(),
            active: true,
            salary: 75000.0,
            joined: NaiveDate::from_ymd_opt(2019, 3, 1).ok_or("invalid date")?,
            department: Some(Department { name: "Engineering".into() }),
        },
        User {
            id: 2,
            name: "Bob Smith".into(),
            email: "bob@example.com".into(),
            active: false,
            salary: 65000.5,
            joined: NaiveDate::from_ymd_opt(2021, 7, 15).ok_or("invalid date")?,
            department: None,
        },
    ];

    // All export columns
    let mut export = ExcelExport::builder()
        .title("Users")
        .formatter("Boolean", |v| match v {
            Value::Bool(b) => Ok(if *b { "Yes" } else { "No" }.to_string()),
            _ => Err(FormatError::new("Boolean", "not a boolean")),
        })
        .build_for::<User>(ExportMode::Export, &[])?;
    export.set_data_list(&users)?.write_file("users.xlsx")?;
    export.dispose();
    println!("Excel file created successfully: users.xlsx");

    // Group 2 only: name, department, salary
    let mut export = ExcelExport::for_record::<User>("Payroll", ExportMode::Export, &[2])?;
    println!("Payroll columns: {:?}", export.plan().headers().collect::<Vec<_>>());
    export.set_data_list(&users)?.write_file("payroll.xlsx")?;
    export.dispose();
    println!("Excel file created successfully: payroll.xlsx");

    // Import template: headers only
    let mut template = ExcelExport::for_record::<User>("Import users", ExportMode::Import, &[])?;
    template.write_file("users_template.xlsx")?;
    template.dispose();
    println!("Excel file created successfully: users_template.xlsx");

    Ok(())
}
