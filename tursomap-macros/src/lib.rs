use darling::FromDeriveInput;
use darling::FromField;
use darling::FromVariant;
use proc_macro2::Ident;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::DeriveInput;
use syn::Generics;
use syn::Visibility;

#[derive(Debug, FromField)]
#[darling(attributes(tursomap))]
struct FieldReceiver {
    pub ident: Option<Ident>,
    pub vis:   Visibility,

    #[darling(default)]
    pub rename: Option<String>,

    #[darling(default)]
    pub skip: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(tursomap), supports(struct_named, struct_tuple))]
struct RecordReceiver {
    pub ident:    Ident,
    pub generics: Generics,
    pub data:     darling::ast::Data<(), FieldReceiver>,
}

#[derive(Debug, FromVariant)]
#[darling(attributes(tursomap), forward_attrs(default))]
struct VariantReceiver {
    pub ident: Ident,
    pub attrs: Vec<syn::Attribute>,

    #[darling(default)]
    pub rename: Option<String>,
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(tursomap), supports(enum_unit))]
struct EnumReceiver {
    pub ident:    Ident,
    pub generics: Generics,
    pub data:     darling::ast::Data<VariantReceiver, ()>,
}

#[derive(Debug)]
struct MemberInfo {
    pub field_name:  Ident,
    pub member_name: String,
    pub is_public:   bool,
}

#[derive(Debug)]
enum RecordInfo {
    Named { struct_name: Ident, generics: Generics, members: Vec<MemberInfo> },
    Tuple { struct_name: Ident, generics: Generics, arity: usize },
}

#[derive(Debug)]
struct VariantInfo {
    pub ident:      Ident,
    pub name:       String,
    pub is_default: bool,
}

#[derive(Debug)]
struct EnumInfo {
    pub enum_name: Ident,
    pub generics:  Generics,
    pub variants:  Vec<VariantInfo>,
}

impl RecordReceiver {
    pub fn to_record_info(self) -> darling::Result<RecordInfo> {
        let fields = self.data.take_struct().ok_or_else(|| darling::Error::unsupported_shape("enum"))?;

        if fields.style.is_tuple() {
            return Ok(RecordInfo::Tuple { struct_name: self.ident, generics: self.generics, arity: fields.len() });
        }

        let mut members = Vec::new();
        for field in fields.into_iter().filter(|f| !f.skip) {
            let field_name = field.ident.ok_or_else(|| darling::Error::custom("Expected named field"))?;
            let member_name = field.rename.unwrap_or_else(|| field_name.to_string());
            let is_public = matches!(field.vis, Visibility::Public(_));
            members.push(MemberInfo { field_name, member_name, is_public });
        }

        Ok(RecordInfo::Named { struct_name: self.ident, generics: self.generics, members })
    }
}

impl EnumReceiver {
    pub fn to_enum_info(self) -> darling::Result<EnumInfo> {
        let variants = self.data.take_enum().ok_or_else(|| darling::Error::unsupported_shape("struct"))?;

        let variants = variants
            .into_iter()
            .map(|v| {
                let is_default = v.attrs.iter().any(|a| a.path().is_ident("default"));
                let name = v.rename.unwrap_or_else(|| v.ident.to_string());
                VariantInfo { ident: v.ident, name, is_default }
            })
            .collect();

        Ok(EnumInfo { enum_name: self.ident, generics: self.generics, variants })
    }
}

/// Derive `FromRow` for a struct
///
/// Named structs bind columns to fields by name and need `Default`: fields
/// without a matching column keep their default value. Tuple structs bind
/// their fields positionally from the leading columns.
///
/// Field attributes: `#[tursomap(rename = "...")]` binds the field under
/// another name, `#[tursomap(skip)]` never binds it.
#[proc_macro_derive(FromRow, attributes(tursomap))]
pub fn derive_from_row(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    let info = match RecordReceiver::from_derive_input(&input).and_then(RecordReceiver::to_record_info) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let expanded = match &info {
        RecordInfo::Named { struct_name, generics, members } => impl_named_from_row(struct_name, generics, members),
        RecordInfo::Tuple { struct_name, generics, arity } => impl_tuple_from_row(struct_name, generics, *arity),
    };
    proc_macro::TokenStream::from(expanded)
}

fn impl_named_from_row(name: &Ident, generics: &Generics, members: &[MemberInfo]) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let member_entries: Vec<_> = members
        .iter()
        .map(|m| {
            let member_name = &m.member_name;
            let is_public = m.is_public;
            quote! { tursomap::Member::new(#member_name, #is_public) }
        })
        .collect();

    let slot_arms: Vec<_> = members
        .iter()
        .enumerate()
        .map(|(slot, m)| {
            let field_name = &m.field_name;
            quote! { #slot => record.#field_name = row.take(ordinal)? }
        })
        .collect();

    let body = if members.is_empty() {
        quote! {
            let _ = row;
            Ok(<Self as ::core::default::Default>::default())
        }
    } else {
        quote! {
            let mut record = <Self as ::core::default::Default>::default();
            let plan = row.plan();
            for (ordinal, slot) in plan.matches() {
                match slot {
                    #(#slot_arms,)*
                    _ => {}
                }
            }
            Ok(record)
        }
    };

    quote! {
        impl #impl_generics tursomap::FromRow for #name #ty_generics #where_clause {
            fn shape() -> tursomap::Shape {
                tursomap::Shape::Record
            }

            fn members() -> &'static [tursomap::Member] {
                const MEMBERS: &[tursomap::Member] = &[#(#member_entries),*];
                MEMBERS
            }

            fn from_row(row: &mut tursomap::RowBinding<'_>) -> tursomap::Result<Self> {
                #body
            }
        }
    }
}

fn impl_tuple_from_row(name: &Ident, generics: &Generics, arity: usize) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let takes: Vec<_> = (0..arity).map(|ordinal| quote! { row.take(#ordinal)? }).collect();

    quote! {
        impl #impl_generics tursomap::FromRow for #name #ty_generics #where_clause {
            fn shape() -> tursomap::Shape {
                tursomap::Shape::Tuple(#arity)
            }

            fn from_row(row: &mut tursomap::RowBinding<'_>) -> tursomap::Result<Self> {
                Ok(Self(#(#takes),*))
            }
        }
    }
}

/// Derive `FromValue`, `IntoValue` and `FromRow` for a unit-only enum
///
/// Text values are matched against variant names, exactly first and then
/// ignoring case. Integer values are matched against discriminants. Values
/// are stored as the variant name. A variant marked `#[default]` is what a
/// null turns into when nulls convert to defaults.
///
/// Variant attributes: `#[tursomap(rename = "...")]` stores the variant under
/// another name.
#[proc_macro_derive(FromValue, attributes(tursomap))]
pub fn derive_from_value(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    let info = match EnumReceiver::from_derive_input(&input).and_then(EnumReceiver::to_enum_info) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    proc_macro::TokenStream::from(impl_enum_value(&info))
}

fn impl_enum_value(info: &EnumInfo) -> TokenStream2 {
    let name = &info.enum_name;
    let target = name.to_string();
    let (impl_generics, ty_generics, where_clause) = info.generics.split_for_impl();

    let exact_arms: Vec<_> = info
        .variants
        .iter()
        .map(|v| {
            let ident = &v.ident;
            let variant_name = &v.name;
            quote! { #variant_name => return Ok(Self::#ident) }
        })
        .collect();

    let caseless_checks: Vec<_> = info
        .variants
        .iter()
        .map(|v| {
            let ident = &v.ident;
            let variant_name = &v.name;
            quote! {
                if text.eq_ignore_ascii_case(#variant_name) {
                    return Ok(Self::#ident);
                }
            }
        })
        .collect();

    let discriminant_checks: Vec<_> = info
        .variants
        .iter()
        .map(|v| {
            let ident = &v.ident;
            quote! {
                if n == Self::#ident as i64 {
                    return Ok(Self::#ident);
                }
            }
        })
        .collect();

    let into_arms: Vec<_> = info
        .variants
        .iter()
        .map(|v| {
            let ident = &v.ident;
            let variant_name = &v.name;
            quote! { Self::#ident => #variant_name }
        })
        .collect();

    let from_null = info.variants.iter().find(|v| v.is_default).map(|v| {
        let ident = &v.ident;
        quote! {
            fn from_null(
                conversion: tursomap::NullConversion,
            ) -> ::std::result::Result<Self, tursomap::ConversionError> {
                match conversion {
                    tursomap::NullConversion::AllTypes => Ok(Self::#ident),
                    tursomap::NullConversion::TextOnly => Err(tursomap::ConversionError::UnexpectedNull),
                }
            }
        }
    });

    quote! {
        impl #impl_generics tursomap::FromValue for #name #ty_generics #where_clause {
            fn from_value(value: tursomap::Value) -> ::std::result::Result<Self, tursomap::ConversionError> {
                match value {
                    tursomap::Value::Text(text) => {
                        match text.as_str() {
                            #(#exact_arms,)*
                            _ => {}
                        }
                        #(#caseless_checks)*
                        Err(tursomap::ConversionError::UnknownVariant { target: #target, value: text })
                    }
                    tursomap::Value::Integer(n) => {
                        #(#discriminant_checks)*
                        Err(tursomap::ConversionError::OutOfRange { target: #target, value: n.to_string() })
                    }
                    other => Err(tursomap::ConversionError::Mismatch {
                        expected: "Text or Integer",
                        actual:   tursomap::value_kind(&other).to_string(),
                    }),
                }
            }

            #from_null
        }

        impl #impl_generics tursomap::IntoValue for #name #ty_generics #where_clause {
            fn into_value(self) -> tursomap::Value {
                let name: &str = match self {
                    #(#into_arms,)*
                };
                tursomap::Value::Text(name.to_string())
            }
        }

        impl #impl_generics tursomap::FromRow for #name #ty_generics #where_clause {
            fn shape() -> tursomap::Shape {
                tursomap::Shape::Simple
            }

            fn from_row(row: &mut tursomap::RowBinding<'_>) -> tursomap::Result<Self> {
                row.take(0)
            }
        }
    }
}
