//! The `Sales` schema used across the semantic tests.
//!
//! Contents (alias `S`):
//! - `Customer` with key `ID`, `Name`, `Address` and the collection navigation `Orders`
//! - `VipCustomer` deriving from `Customer`, adding the navigation `Manager`
//! - `Order` with key `ID` and the required navigation `Customer` (constraint `CustomerID -> ID`)
//! - `Address` (complex), `Tier` (enum), `Money` (type definition over `Edm.Decimal`)
//! - Two `Discount` function overloads, the bound action `Rename` and the function
//!   `TopCustomers` bound to a customer collection
//! - Terms `Note` (untyped) and `Label` (string, properties only)
//! - The container `Service` with `Customers`, `Orders`, `Boss` and the import `Discounts`

use crate::csdl::{CsdlSchema, CsdlTypeReference, SchemaBuilder};

fn builder() -> SchemaBuilder {
    SchemaBuilder::new("Sales")
        .alias("S")
        .entity_type("Customer", |t| {
            t.key(&["ID"])
                .property("ID", "Edm.Int32", false)
                .property("Name", "Edm.String", true)
                .property("Address", "Sales.Address", true)
                .navigation("Orders", "Collection(Sales.Order)", |n| n.partner("Customer"))
        })
        .entity_type("VipCustomer", |t| {
            t.base("Sales.Customer")
                .navigation("Manager", "Sales.Customer", |n| n)
        })
        .entity_type("Order", |t| {
            t.key(&["ID"])
                .property("ID", "Edm.Int32", false)
                .property("CustomerID", "Edm.Int32", false)
                .navigation("Customer", "Sales.Customer", |n| {
                    n.required()
                        .partner("Orders")
                        .constraint("CustomerID", "ID")
                })
        })
        .complex_type("Address", |t| {
            t.property("Street", "Edm.String", true)
                .property("City", "Edm.String", true)
        })
        .enum_type("Tier", |e| e.member("Bronze").member("Silver").member("Gold"))
        .type_definition("Money", "Edm.Decimal")
        .function("Discount", |f| {
            f.parameter("percent", "Edm.Int32", false)
                .returns("Edm.Decimal", false)
        })
        .function("Discount", |f| {
            f.parameter("percent", "Edm.Int32", false)
                .parameter("cap", "Sales.Money", false)
                .returns("Edm.Decimal", false)
        })
        .action("Rename", |a| {
            a.bound()
                .parameter("customer", "Sales.Customer", false)
                .parameter("name", "Edm.String", false)
        })
        .function("TopCustomers", |f| {
            f.bound()
                .parameter("customers", "Collection(Sales.Customer)", false)
                .parameter("count", "Edm.Int32", false)
                .returns("Collection(Sales.Customer)", false)
        })
        .term("Note", "Edm.Untyped")
        .term_with(
            "Label",
            CsdlTypeReference::new("Edm.String", true),
            &["Property", "NavigationProperty"],
            None,
        )
        .entity_container("Service", |c| {
            c.entity_set_with("Customers", "Sales.Customer", |s| s.binding("Orders", "Orders"))
                .entity_set_with("Orders", "Sales.Order", |s| s.binding("Customer", "Customers"))
                .singleton("Boss", "Sales.Customer")
                .function_import("Discounts", "Sales.Discount", None)
        })
}

/// The plain `Sales` schema.
pub fn sales_schema() -> CsdlSchema {
    builder().build().expect("sales schema is well formed")
}

/// The `Sales` schema with additional declarations appended by `extend`.
pub fn sales_schema_with(extend: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> CsdlSchema {
    extend(builder())
        .build()
        .expect("extended sales schema is well formed")
}
