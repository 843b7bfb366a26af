//! Record derive macro implementation

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::DeriveInput;

use crate::parse::{parse_record, RecordArgs, RecordFieldArgs};

/// FNV-1a 32-bit hash (compile-time computation in proc macro)
const fn fnv1a_32(data: &[u8]) -> u32 {
    const FNV_OFFSET_BASIS: u32 = 0x811c9dc5;
    const FNV_PRIME: u32 = 0x01000193;

    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < data.len() {
        hash ^= data[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Accessor base name: the Rust identifier without a leading underscore
fn clean_name(field: &RecordFieldArgs) -> Option<String> {
    let ident = field.ident.as_ref()?.to_string();
    Some(ident.strip_prefix('_').unwrap_or(&ident).to_string())
}

/// Generate the Record implementation
pub fn derive_record(input: DeriveInput) -> TokenStream {
    match parse_record(&input) {
        Ok(args) => generate_impl(args),
        Err(e) => e.write_errors(),
    }
}

fn generate_impl(args: RecordArgs) -> TokenStream {
    let struct_name = args.ident.clone();
    let record_name = args.record_name();

    // Get fields
    let fields = match args.data {
        darling::ast::Data::Struct(fields) => fields.fields,
        _ => {
            return syn::Error::new_spanned(&args.ident, "Record can only be derived for structs")
                .to_compile_error()
        }
    };

    let record_fields: Vec<&RecordFieldArgs> =
        fields.iter().filter(|f| f.is_record_field()).collect();

    // Reject duplicate external names at compile time
    for (i, field) in record_fields.iter().enumerate() {
        let name = field.external_name();
        if record_fields[..i].iter().any(|f| f.external_name() == name) {
            return syn::Error::new_spanned(
                field.ident.as_ref(),
                format!("duplicate record field name `{}`", name),
            )
            .to_compile_error();
        }
    }

    let constants: Vec<_> = record_fields.iter().map(|f| generate_constants(f)).collect();
    let accessors: Vec<_> = record_fields.iter().map(|f| generate_accessors(f)).collect();
    let typed_record_impl = generate_typed_record_impl(&struct_name, &record_name, &record_fields);

    quote! {
        impl #struct_name {
            #(#constants)*
            #(#accessors)*
        }

        #typed_record_impl
    }
}

fn generate_constants(field: &RecordFieldArgs) -> TokenStream {
    let Some(clean) = clean_name(field) else {
        return quote! {};
    };
    let external_name = field.external_name();
    let field_hash = fnv1a_32(external_name.as_bytes());

    let const_name = format_ident!("{}_FIELD", clean.to_uppercase());
    let const_hash = format_ident!("{}_HASH", clean.to_uppercase());

    let field_doc = format!("External field name for `{}`", clean);
    let hash_doc = format!("FNV-1a hash of field name `{}`", external_name);

    quote! {
        #[doc = #field_doc]
        pub const #const_name: &'static str = #external_name;

        #[doc = #hash_doc]
        pub const #const_hash: u32 = #field_hash;
    }
}

fn generate_accessors(field: &RecordFieldArgs) -> TokenStream {
    let (Some(field_ident), Some(clean)) = (field.ident.as_ref(), clean_name(field)) else {
        return quote! {};
    };
    let field_ty = &field.ty;
    let external_name = field.external_name();

    let getter_name = format_ident!("{}", clean);
    let setter_name = format_ident!("set_{}", clean);

    let getter_doc = format!("Get the value of `{}`", external_name);
    let setter_doc = format!("Set the value of `{}`", external_name);

    let getter = quote! {
        #[doc = #getter_doc]
        #[inline]
        pub fn #getter_name(&self) -> &#field_ty {
            &self.#field_ident
        }
    };

    // Generate setter (unless readonly)
    let setter = if field.readonly {
        quote! {}
    } else {
        quote! {
            #[doc = #setter_doc]
            #[inline]
            pub fn #setter_name(&mut self, value: #field_ty) {
                self.#field_ident = value;
            }
        }
    };

    quote! {
        #getter
        #setter
    }
}

fn generate_typed_record_impl(
    struct_name: &syn::Ident,
    record_name: &str,
    fields: &[&RecordFieldArgs],
) -> TokenStream {
    let field_count = fields.len();

    let descriptors = fields.iter().map(|f| {
        let name = f.external_name();
        let ty = &f.ty;
        let settable = !f.readonly;
        quote! {
            ::rowshape_core::convert::RecordField {
                name: #name,
                ty: <#ty as ::rowshape_core::value::FieldValue>::semantic_type(),
                settable: #settable,
            }
        }
    });

    // Only settable fields are copied in by converters
    let populate = fields.iter().filter(|f| !f.readonly).filter_map(|f| {
        let ident = f.ident.as_ref()?;
        let name = f.external_name();
        let ty = &f.ty;
        Some(quote! {
            self.#ident = ::rowshape_core::convert::read_field::<#ty>(source, #name)?;
        })
    });

    let to_expando = fields.iter().filter_map(|f| {
        let ident = f.ident.as_ref()?;
        let name = f.external_name();
        let ty = &f.ty;
        Some(quote! {
            record.insert(
                #name,
                <#ty as ::rowshape_core::value::FieldValue>::into_value(
                    ::std::clone::Clone::clone(&self.#ident),
                ),
            );
        })
    });

    quote! {
        impl ::rowshape_core::convert::TypedRecord for #struct_name {
            const RECORD_NAME: &'static str = #record_name;

            fn fields() -> ::std::vec::Vec<::rowshape_core::convert::RecordField> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_variables)]
            fn populate(
                &mut self,
                source: &::rowshape_core::expando::ExpandoRecord,
            ) -> ::rowshape_core::error::ShapeResult<()> {
                #(#populate)*
                ::std::result::Result::Ok(())
            }

            fn to_expando(&self) -> ::rowshape_core::expando::ExpandoRecord {
                let mut record =
                    ::rowshape_core::expando::ExpandoRecord::with_capacity(#field_count);
                #(#to_expando)*
                record
            }
        }
    }
}
